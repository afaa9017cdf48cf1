use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

use super::model::DrawingSnapshot;

/// How long the canvas must stay quiet before a save fires.
pub const QUIET_INTERVAL: Duration = Duration::from_secs(1);

/// Debounced drawing saver.
///
/// Every mutation pushes the full snapshot; a save fires once no snapshot
/// has arrived for the quiet interval, carrying only the newest state. A
/// save already in flight is not cancelled by newer mutations - saves are
/// whole-document overwrites, so overlapping writes are safe and the later
/// one wins. Save failures are logged, never surfaced back to the
/// interaction path.
pub struct Autosaver {
    tx: mpsc::UnboundedSender<DrawingSnapshot>,
}

impl Autosaver {
    pub fn spawn<F, Fut>(quiet: Duration, save: F) -> Self
    where
        F: Fn(DrawingSnapshot) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<DrawingSnapshot>();

        tokio::spawn(async move {
            while let Some(mut latest) = rx.recv().await {
                // coalesce: every further snapshot restarts the quiet timer
                loop {
                    tokio::select! {
                        next = rx.recv() => match next {
                            Some(snapshot) => latest = snapshot,
                            None => break,
                        },
                        _ = tokio::time::sleep(quiet) => break,
                    }
                }

                // detach so a slow write never delays the next debounce window
                let in_flight = save(latest);
                tokio::spawn(async move {
                    if let Err(e) = in_flight.await {
                        tracing::error!("Failed to autosave drawing: {}", e);
                    }
                });
            }
        });

        Autosaver { tx }
    }

    /// Record a mutation. Returns false once the saver task has shut down.
    pub fn push(&self, snapshot: DrawingSnapshot) -> bool {
        self.tx.send(snapshot).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawings::model::Stroke;
    use std::sync::{Arc, Mutex};

    fn snapshot_with_points(points: Vec<f64>) -> DrawingSnapshot {
        DrawingSnapshot {
            lines: vec![Stroke {
                points,
                stroke: "#000000".to_string(),
                stroke_width: 5.0,
            }],
            fills: Vec::new(),
        }
    }

    fn recording_saver(
        quiet: Duration,
        saved: Arc<Mutex<Vec<DrawingSnapshot>>>,
    ) -> Autosaver {
        Autosaver::spawn(quiet, move |snapshot| {
            let saved = saved.clone();
            async move {
                saved.lock().unwrap().push(snapshot);
                Ok(())
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_mutations_coalesce_into_one_save_with_the_latest_state() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let saver = recording_saver(Duration::from_secs(1), saved.clone());

        for step in 0..3u32 {
            let points = vec![step as f64, step as f64];
            saver.push(snapshot_with_points(points));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tokio::time::sleep(Duration::from_secs(3)).await;

        let saved = saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].lines[0].points, vec![2.0, 2.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn mutations_spaced_past_the_quiet_interval_save_separately() {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let saver = recording_saver(Duration::from_secs(1), saved.clone());

        saver.push(snapshot_with_points(vec![1.0, 1.0]));
        tokio::time::sleep(Duration::from_secs(2)).await;
        saver.push(snapshot_with_points(vec![2.0, 2.0]));
        tokio::time::sleep(Duration::from_secs(2)).await;

        let saved = saved.lock().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0].lines[0].points, vec![1.0, 1.0]);
        assert_eq!(saved[1].lines[0].points, vec![2.0, 2.0]);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_identical_saves_keep_the_same_final_state() {
        // saving the same snapshot twice is idempotent at the sink - the
        // document is overwritten wholesale each time
        let saved = Arc::new(Mutex::new(Vec::new()));
        let saver = recording_saver(Duration::from_secs(1), saved.clone());

        let snapshot = snapshot_with_points(vec![7.0, 7.0]);
        saver.push(snapshot.clone());
        tokio::time::sleep(Duration::from_secs(2)).await;
        saver.push(snapshot.clone());
        tokio::time::sleep(Duration::from_secs(2)).await;

        let saved = saved.lock().unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(saved[0], saved[1]);
        assert_eq!(*saved.last().unwrap(), snapshot);
    }

    #[tokio::test(start_paused = true)]
    async fn save_failures_do_not_stop_later_saves() {
        let attempts = Arc::new(Mutex::new(0u32));
        let saver = Autosaver::spawn(Duration::from_secs(1), {
            let attempts = attempts.clone();
            move |_snapshot| {
                let attempts = attempts.clone();
                async move {
                    let mut attempts = attempts.lock().unwrap();
                    *attempts += 1;
                    if *attempts == 1 {
                        Err("DynamoDB put_item error: throttled".to_string())
                    } else {
                        Ok(())
                    }
                }
            }
        });

        saver.push(snapshot_with_points(vec![1.0, 1.0]));
        tokio::time::sleep(Duration::from_secs(2)).await;
        saver.push(snapshot_with_points(vec![2.0, 2.0]));
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(*attempts.lock().unwrap(), 2);
    }
}
