/// Browser tests for the animation loop lifecycle
#[cfg(target_arch = "wasm32")]
mod web_tests {
    use globe_drop::AnimationLoop;
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_test::*;
    use web_sys::HtmlCanvasElement;

    wasm_bindgen_test_configure!(run_in_browser);

    fn mount_canvas(id: &str) -> HtmlCanvasElement {
        let document = web_sys::window().unwrap().document().unwrap();
        let canvas: HtmlCanvasElement = document
            .create_element("canvas")
            .unwrap()
            .dyn_into()
            .unwrap();
        canvas.set_id(id);
        document.body().unwrap().append_child(&canvas).unwrap();
        canvas
    }

    #[wasm_bindgen_test]
    fn test_missing_canvas_is_an_error() {
        assert!(AnimationLoop::new("no-such-canvas", JsValue::UNDEFINED, None).is_err());
    }

    #[wasm_bindgen_test]
    fn test_stop_detaches_and_is_idempotent() {
        let canvas = mount_canvas("globe-stop");
        let animation = AnimationLoop::new("globe-stop", JsValue::UNDEFINED, None).unwrap();
        assert!(animation.is_running());

        animation.stop();
        assert!(!animation.is_running());

        // Events after teardown reach no handler.
        let ev = web_sys::Event::new("pointerdown").unwrap();
        canvas.dispatch_event(&ev).unwrap();
        animation.stop();
        assert!(!animation.is_running());
    }

    #[wasm_bindgen_test]
    fn test_scripted_drop_after_stop() {
        mount_canvas("globe-drop-item");
        let animation =
            AnimationLoop::new("globe-drop-item", JsValue::from_f64(0.0), None).unwrap();
        animation.set_auto_spawn(false);
        let first = animation.drop_item(0, 0.5, 30.0);
        animation.stop();
        let second = animation.drop_item(0, 0.5, 30.0);
        assert!(first.is_some() && second.is_some());
        assert_ne!(first, second);
    }
}
