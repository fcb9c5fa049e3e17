// ABOUTME: Outbound updates from the deck controller to whatever renders it
// ABOUTME: Broadcasts index, scale, modal, copy, export and notice changes

use log::trace;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::viewport::ScaleTarget;

const UPDATE_CAPACITY: usize = 256;

/// A change the rendering layer must reflect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ViewUpdate {
    /// The active slide changed; `label` is the `"<n> / <N>"` counter text
    #[serde(rename_all = "camelCase")]
    Slide { index: usize, label: String },
    Scale { scale: f64 },
    Modal { open: bool },
    Copied { key: String, copied: bool },
    #[serde(rename_all = "camelCase")]
    Exporting { in_flight: bool },
    /// A message the user must see
    Notice { message: String },
    Fullscreen,
    /// A finished export the page should save as a synthetic download
    #[serde(rename_all = "camelCase")]
    Download { file_name: String, data_uri: String },
}

/// Cloneable publisher for [`ViewUpdate`]s.
///
/// Publishing never fails: with no subscribers the update is dropped.
#[derive(Debug, Clone)]
pub struct ViewHandle {
    tx: broadcast::Sender<ViewUpdate>,
}

impl Default for ViewHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewHandle {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(UPDATE_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ViewUpdate> {
        self.tx.subscribe()
    }

    pub fn publish(&self, update: ViewUpdate) {
        trace!("View update: {:?}", update);
        let _ = self.tx.send(update);
    }

    pub fn slide(&self, index: usize, len: usize) {
        self.publish(ViewUpdate::Slide {
            index,
            label: slide_counter(index, len),
        });
    }

    pub fn notice(&self, message: impl Into<String>) {
        self.publish(ViewUpdate::Notice {
            message: message.into(),
        });
    }
}

impl ScaleTarget for ViewHandle {
    fn apply_scale(&self, scale: f64) {
        self.publish(ViewUpdate::Scale { scale });
    }
}

/// Counter text shown in the brand bar
pub fn slide_counter(index: usize, len: usize) -> String {
    format!("{} / {}", index + 1, len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_counter_is_one_based() {
        assert_eq!(slide_counter(0, 16), "1 / 16");
        assert_eq!(slide_counter(15, 16), "16 / 16");
    }

    #[test]
    fn test_updates_serialize_with_type_tag() {
        let json = serde_json::to_string(&ViewUpdate::Exporting { in_flight: true }).unwrap();
        assert_eq!(json, r#"{"type":"exporting","inFlight":true}"#);

        let json = serde_json::to_string(&ViewUpdate::Download {
            file_name: "Slide_1.png".to_string(),
            data_uri: "data:image/png;base64,AA==".to_string(),
        })
        .unwrap();
        assert!(json.contains(r#""fileName":"Slide_1.png""#));
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let view = ViewHandle::new();
        view.notice("nobody listening");
    }

    #[tokio::test]
    async fn test_scale_target_publishes_scale() {
        let view = ViewHandle::new();
        let mut rx = view.subscribe();
        view.apply_scale(0.75);
        assert_eq!(rx.recv().await.unwrap(), ViewUpdate::Scale { scale: 0.75 });
    }
}
