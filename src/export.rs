// ABOUTME: Sequential slide export pipeline
// ABOUTME: Selects, settles, rasterizes and persists slides, then restores the original selection

use std::io::Cursor;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use base64::Engine;
use image::io::Reader as ImageReader;
use image::ImageFormat;
use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::config::ExportConfig;
use crate::errors::{DeckError, Result};
use crate::navigator::SharedState;
use crate::view::{ViewHandle, ViewUpdate};

/// Options passed to the rasterizer for every capture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    /// Oversampling factor relative to the design canvas
    pub scale: f64,
    /// Leave uncovered pixels fully transparent
    pub transparent_background: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            transparent_background: true,
        }
    }
}

/// An encoded PNG produced by a rasterizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideImage {
    png: Vec<u8>,
    width: u32,
    height: u32,
}

impl SlideImage {
    /// Wrap PNG bytes, validating the header and reading the dimensions.
    pub fn from_png(png: Vec<u8>) -> Result<Self> {
        let (width, height) =
            ImageReader::with_format(Cursor::new(&png), ImageFormat::Png).into_dimensions()?;
        Ok(Self { png, width, height })
    }

    pub fn png(&self) -> &[u8] {
        &self.png
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn to_data_uri(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }
}

/// Turns the rendered surface of a slide into an image.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn capture(&self, index: usize, options: &CaptureOptions) -> Result<SlideImage>;
}

/// Destination for exported slide images.
pub trait ImageSink: Send + Sync {
    fn persist(&self, file_name: &str, image: &SlideImage) -> Result<()>;
}

/// Deterministic output name for a slide, numbered from 1
pub fn export_file_name(index: usize) -> String {
    format!("Slide_{}.png", index + 1)
}

/// Where a job currently is in its per-target sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Idle,
    Selecting,
    AwaitingRender,
    Capturing,
    Persisting,
}

/// Targets of a single export invocation and the selection to restore afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportJob {
    pub targets: Vec<usize>,
    pub original_index: usize,
}

/// The first target that could not be exported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFailure {
    pub slide: usize,
    pub message: String,
}

/// Outcome of a job that ran. Failures are reported here, never as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub job: ExportJob,
    pub exported: Vec<String>,
    pub failure: Option<ExportFailure>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.exported.len() == self.job.targets.len()
    }
}

/// Runs export jobs one at a time against the shared deck state.
pub struct ExportPipeline {
    len: usize,
    state: SharedState,
    rasterizer: Option<Arc<dyn Rasterizer>>,
    sink: Arc<dyn ImageSink>,
    config: ExportConfig,
    view: ViewHandle,
    phase: Mutex<ExportPhase>,
}

impl ExportPipeline {
    pub fn new(
        len: usize,
        state: SharedState,
        rasterizer: Option<Arc<dyn Rasterizer>>,
        sink: Arc<dyn ImageSink>,
        config: ExportConfig,
        view: ViewHandle,
    ) -> Self {
        Self {
            len,
            state,
            rasterizer,
            sink,
            config,
            view,
            phase: Mutex::new(ExportPhase::Idle),
        }
    }

    pub fn phase(&self) -> ExportPhase {
        *self.phase.lock()
    }

    pub fn is_available(&self) -> bool {
        self.rasterizer.is_some()
    }

    /// Export the currently displayed slide.
    pub async fn export_one(&self) -> Result<ExportReport> {
        let rasterizer = self.require_rasterizer()?;
        let lock = ExportLock::acquire(self)?;
        let job = ExportJob {
            targets: vec![lock.original_index],
            original_index: lock.original_index,
        };
        Ok(self.run(job, rasterizer.as_ref(), lock).await)
    }

    /// Export one slide by index, selecting it for the capture and restoring
    /// the current selection afterwards.
    pub async fn export_slide(&self, index: usize) -> Result<ExportReport> {
        if index >= self.len {
            return Err(DeckError::InvalidSlide {
                index,
                len: self.len,
            });
        }
        let rasterizer = self.require_rasterizer()?;
        let lock = ExportLock::acquire(self)?;
        let job = ExportJob {
            targets: vec![index],
            original_index: lock.original_index,
        };
        Ok(self.run(job, rasterizer.as_ref(), lock).await)
    }

    /// Export every slide in presentation order.
    pub async fn export_all(&self) -> Result<ExportReport> {
        let rasterizer = self.require_rasterizer()?;
        let lock = ExportLock::acquire(self)?;
        let job = ExportJob {
            targets: (0..self.len).collect(),
            original_index: lock.original_index,
        };
        Ok(self.run(job, rasterizer.as_ref(), lock).await)
    }

    fn require_rasterizer(&self) -> Result<Arc<dyn Rasterizer>> {
        match &self.rasterizer {
            Some(rasterizer) => Ok(Arc::clone(rasterizer)),
            None => {
                error!("Export requested but no rasterizer is available");
                Err(DeckError::RasterizerUnavailable(
                    "the slide rasterizer could not be loaded".to_string(),
                ))
            }
        }
    }

    async fn run(
        &self,
        job: ExportJob,
        rasterizer: &dyn Rasterizer,
        lock: ExportLock<'_>,
    ) -> ExportReport {
        info!(
            "Exporting {} slide(s), returning to slide {} afterwards",
            job.targets.len(),
            job.original_index + 1
        );
        let started = Instant::now();
        let mut exported = Vec::with_capacity(job.targets.len());
        let mut failure = None;

        for &target in &job.targets {
            match self.export_target(target, rasterizer).await {
                Ok(file_name) => exported.push(file_name),
                Err(e) => {
                    error!("Export of slide {} failed: {}", target + 1, e);
                    failure = Some(ExportFailure {
                        slide: target,
                        message: e.to_string(),
                    });
                    break;
                }
            }
            tokio::time::sleep(self.config.pacing).await;
        }

        drop(lock);

        info!(
            "Exported {} of {} slide(s) in {:.2} seconds",
            exported.len(),
            job.targets.len(),
            started.elapsed().as_secs_f64()
        );
        ExportReport {
            job,
            exported,
            failure,
        }
    }

    async fn export_target(&self, target: usize, rasterizer: &dyn Rasterizer) -> Result<String> {
        if target >= self.len {
            return Err(DeckError::InvalidSlide {
                index: target,
                len: self.len,
            });
        }

        self.set_phase(ExportPhase::Selecting);
        let changed = {
            let mut state = self.state.lock();
            let changed = state.current_index() != target;
            if changed {
                state.select(target);
            }
            changed
        };
        if changed {
            debug!("Selected slide {} for export", target + 1);
            self.view.slide(target, self.len);
            self.set_phase(ExportPhase::AwaitingRender);
            tokio::time::sleep(self.config.settle).await;
        }

        self.set_phase(ExportPhase::Capturing);
        let options = CaptureOptions {
            scale: self.config.capture_scale,
            transparent_background: true,
        };
        let image = rasterizer.capture(target, &options).await?;

        self.set_phase(ExportPhase::Persisting);
        let file_name = export_file_name(target);
        self.sink.persist(&file_name, &image)?;
        let (width, height) = image.dimensions();
        info!("Rendered {} ({}x{})", file_name, width, height);
        Ok(file_name)
    }

    fn set_phase(&self, phase: ExportPhase) {
        *self.phase.lock() = phase;
    }
}

/// Scoped ownership of the export slot.
///
/// Acquiring marks an export in flight and records the selection; dropping
/// restores that selection and clears the flag on every exit path,
/// including a failed target or a cancelled job.
struct ExportLock<'a> {
    pipeline: &'a ExportPipeline,
    original_index: usize,
}

impl<'a> ExportLock<'a> {
    fn acquire(pipeline: &'a ExportPipeline) -> Result<Self> {
        let original_index = {
            let mut state = pipeline.state.lock();
            if state.is_export_in_flight() {
                warn!("Export requested while another export is running");
                return Err(DeckError::ExportBusy);
            }
            state.set_export_in_flight(true);
            state.current_index()
        };
        pipeline
            .view
            .publish(ViewUpdate::Exporting { in_flight: true });
        Ok(Self {
            pipeline,
            original_index,
        })
    }
}

impl Drop for ExportLock<'_> {
    fn drop(&mut self) {
        let restored = {
            let mut state = self.pipeline.state.lock();
            let restored = state.current_index() != self.original_index;
            if restored {
                state.select(self.original_index);
            }
            state.set_export_in_flight(false);
            restored
        };
        *self.pipeline.phase.lock() = ExportPhase::Idle;
        if restored {
            debug!("Restored slide {}", self.original_index + 1);
            self.pipeline
                .view
                .slide(self.original_index, self.pipeline.len);
        }
        self.pipeline
            .view
            .publish(ViewUpdate::Exporting { in_flight: false });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::DeckState;
    use crate::testing::{png_bytes, MemorySink, RecordingRasterizer};
    use std::time::Duration;

    fn pipeline(
        len: usize,
        start: usize,
        rasterizer: Option<Arc<RecordingRasterizer>>,
        sink: Arc<MemorySink>,
    ) -> (ExportPipeline, SharedState) {
        let mut state = DeckState::new();
        state.select(start);
        let state = Arc::new(Mutex::new(state));
        let pipeline = ExportPipeline::new(
            len,
            Arc::clone(&state),
            rasterizer.map(|r| r as Arc<dyn Rasterizer>),
            sink,
            ExportConfig::default(),
            ViewHandle::new(),
        );
        (pipeline, state)
    }

    #[test]
    fn test_file_names_are_one_based() {
        assert_eq!(export_file_name(0), "Slide_1.png");
        assert_eq!(export_file_name(9), "Slide_10.png");
    }

    #[test]
    fn test_slide_image_reads_dimensions() {
        let image = SlideImage::from_png(png_bytes(8, 4)).unwrap();
        assert_eq!(image.dimensions(), (8, 4));
        assert!(image.to_data_uri().starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn test_slide_image_rejects_garbage() {
        assert!(SlideImage::from_png(b"not a png".to_vec()).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_all_visits_in_order_and_restores() {
        let rasterizer = RecordingRasterizer::new();
        let sink = MemorySink::new();
        let (pipeline, state) = pipeline(10, 5, Some(rasterizer.clone()), Arc::clone(&sink));
        rasterizer.observe(Arc::clone(&state));

        let report = pipeline.export_all().await.unwrap();

        assert!(report.is_complete());
        assert_eq!(rasterizer.visits(), (0..10).collect::<Vec<_>>());
        // Each capture happened while the deck displayed its target.
        assert_eq!(rasterizer.displayed(), (0..10).collect::<Vec<_>>());
        assert_eq!(sink.names()[0], "Slide_1.png");
        assert_eq!(sink.names()[9], "Slide_10.png");
        assert_eq!(state.lock().current_index(), 5);
        assert!(!state.lock().is_export_in_flight());
        assert_eq!(pipeline.phase(), ExportPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_one_twice_writes_same_name_without_moving() {
        let rasterizer = RecordingRasterizer::new();
        let sink = MemorySink::new();
        let (pipeline, state) = pipeline(6, 2, Some(rasterizer.clone()), Arc::clone(&sink));

        pipeline.export_one().await.unwrap();
        pipeline.export_one().await.unwrap();

        assert_eq!(sink.names(), vec!["Slide_3.png", "Slide_3.png"]);
        assert_eq!(rasterizer.visits(), vec![2, 2]);
        assert_eq!(state.lock().current_index(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_one_skips_settle_window() {
        let rasterizer = RecordingRasterizer::new();
        let (pipeline, _state) = pipeline(3, 1, Some(rasterizer), MemorySink::new());

        let started = tokio::time::Instant::now();
        pipeline.export_one().await.unwrap();

        // Only the pacing window elapses when the target is already shown.
        assert_eq!(started.elapsed(), Duration::from_millis(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_slide_selects_then_restores() {
        let rasterizer = RecordingRasterizer::new();
        let sink = MemorySink::new();
        let (pipeline, state) = pipeline(6, 1, Some(rasterizer.clone()), Arc::clone(&sink));
        rasterizer.observe(Arc::clone(&state));

        let started = tokio::time::Instant::now();
        let report = pipeline.export_slide(4).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(sink.names(), vec!["Slide_5.png"]);
        assert_eq!(rasterizer.displayed(), vec![4]);
        assert_eq!(started.elapsed(), Duration::from_millis(160));
        assert_eq!(state.lock().current_index(), 1);
    }

    #[tokio::test]
    async fn test_export_slide_out_of_range_is_rejected() {
        let (pipeline, state) = pipeline(3, 0, Some(RecordingRasterizer::new()), MemorySink::new());

        let result = pipeline.export_slide(3).await;

        assert!(matches!(result, Err(DeckError::InvalidSlide { index: 3, len: 3 })));
        assert!(!state.lock().is_export_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_mid_job_still_restores() {
        let rasterizer = RecordingRasterizer::failing_at(3);
        let sink = MemorySink::new();
        let (pipeline, state) = pipeline(8, 6, Some(rasterizer.clone()), Arc::clone(&sink));

        let report = pipeline.export_all().await.unwrap();

        let failure = report.failure.as_ref().unwrap();
        assert_eq!(failure.slide, 3);
        assert_eq!(report.exported.len(), 3);
        assert_eq!(rasterizer.visits(), vec![0, 1, 2, 3]);
        assert_eq!(sink.names().len(), 3);
        assert_eq!(state.lock().current_index(), 6);
        assert!(!state.lock().is_export_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_failure_aborts_and_restores() {
        let sink = MemorySink::failing();
        let (pipeline, state) =
            pipeline(4, 2, Some(RecordingRasterizer::new()), Arc::clone(&sink));

        let report = pipeline.export_all().await.unwrap();

        assert_eq!(report.failure.unwrap().slide, 0);
        assert_eq!(state.lock().current_index(), 2);
        assert!(!state.lock().is_export_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_rasterizer_aborts_before_mutation() {
        let (pipeline, state) = pipeline(4, 1, None, MemorySink::new());
        let before = state.lock().clone();

        let result = pipeline.export_all().await;

        assert!(matches!(result, Err(DeckError::RasterizerUnavailable(_))));
        assert_eq!(*state.lock(), before);
        assert!(!pipeline.is_available());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_export_is_rejected() {
        let rasterizer = RecordingRasterizer::new();
        let sink = MemorySink::new();
        let (pipeline, state) = pipeline(5, 4, Some(rasterizer.clone()), Arc::clone(&sink));

        let (first, second) = tokio::join!(pipeline.export_all(), async {
            tokio::task::yield_now().await;
            pipeline.export_one().await
        });

        assert!(first.unwrap().is_complete());
        assert!(matches!(second, Err(DeckError::ExportBusy)));
        assert_eq!(rasterizer.visits(), vec![0, 1, 2, 3, 4]);
        assert_eq!(state.lock().current_index(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_job_releases_lock() {
        let rasterizer = RecordingRasterizer::new();
        let (pipeline, state) = pipeline(5, 0, Some(rasterizer), MemorySink::new());

        let job = pipeline.export_all();
        let _ = tokio::time::timeout(Duration::from_millis(150), job).await;

        assert_eq!(state.lock().current_index(), 0);
        assert!(!state.lock().is_export_in_flight());
        assert!(pipeline.export_one().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_uses_configured_options() {
        let rasterizer = RecordingRasterizer::new();
        let (pipeline, _state) = pipeline(2, 0, Some(rasterizer.clone()), MemorySink::new());

        pipeline.export_one().await.unwrap();

        assert_eq!(
            rasterizer.options(),
            vec![CaptureOptions {
                scale: 2.0,
                transparent_background: true
            }]
        );
    }
}
