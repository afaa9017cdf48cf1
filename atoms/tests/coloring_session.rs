use colorbook_atoms::canvas::{Autosaver, CanvasEngine, DrawingSnapshot, Tool};
use colorbook_atoms::images::model::Mask;
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn recording_saver(saved: Arc<Mutex<Vec<DrawingSnapshot>>>) -> Autosaver {
    Autosaver::spawn(Duration::from_secs(1), move |snapshot| {
        let saved = saved.clone();
        async move {
            saved.lock().unwrap().push(snapshot);
            Ok(())
        }
    })
}

#[tokio::test(start_paused = true)]
async fn a_drawing_session_autosaves_the_final_canvas_state() {
    // the page arrives before segmentation has finished - no masks yet,
    // which is a normal interim state
    let mut engine = CanvasEngine::new("https://replicate.delivery/pbxt/cat.png", None);

    engine.pointer_down(100.0, 100.0);
    engine.pointer_move(110.0, 105.0);
    engine.pointer_move(120.0, 112.0);
    engine.pointer_up();

    let saved = Arc::new(Mutex::new(Vec::new()));
    let saver = recording_saver(saved.clone());
    saver.push(engine.snapshot());

    tokio::time::sleep(Duration::from_secs(2)).await;

    let saved = saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(
        saved[0].lines[0].points,
        vec![100.0, 100.0, 110.0, 105.0, 120.0, 112.0]
    );
    assert!(saved[0].fills.is_empty());
}

#[tokio::test(start_paused = true)]
async fn fills_work_before_and_after_masks_arrive() {
    // before masks: the circle fallback keeps fill mode usable
    let mut engine = CanvasEngine::new("https://replicate.delivery/pbxt/cat.png", None);
    engine.set_tool(Tool::Fill);
    engine.pointer_down(300.0, 300.0);
    assert_eq!(engine.fills()[0].mask_index, -1);

    // once segmentation lands the same tap anchors to a mask
    let masks = vec![Mask {
        bbox: [250.0, 250.0, 350.0, 350.0],
        mask_path: Some("mask-0".to_string()),
        segmentation: None,
        score: 0.97,
    }];
    let mut engine = CanvasEngine::new("https://replicate.delivery/pbxt/cat.png", Some(masks));
    engine.set_tool(Tool::Fill);
    engine.pointer_down(300.0, 300.0);
    assert_eq!(engine.fills()[0].mask_index, 0);

    let saved = Arc::new(Mutex::new(Vec::new()));
    let saver = recording_saver(saved.clone());
    saver.push(engine.snapshot());
    tokio::time::sleep(Duration::from_secs(2)).await;

    let saved = saved.lock().unwrap();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].fills.len(), 1);
    assert!(saved[0].lines.is_empty());
}
