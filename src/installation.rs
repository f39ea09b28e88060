//! Per-frame state of the installation.
//!
//! [`Installation::update`] runs one tick of the sonification loop and
//! [`Installation::segments`] turns the resulting state into the frame's
//! display list. Both run on the render thread.

use anyhow::Context;
use cgmath::Point3;

use crate::config::DepthwaveConfig;
use crate::scene::{
    self, Curve, OrbitCamera, Projector, Scanner, Segment, Shade, Tween, VertexBuffer,
    FUTURE_GREY, LIGHT_BLUE, WHITE,
};
use crate::sonify::{
    fill_alpha, project_frame, DepthFrame, DepthSource, GainContour, GainSummary, SynthEngine,
    Trigger, TriggerState, BASELINE,
};
use crate::spectrogram::{AgeTransform, Direction, RingHistory};

/// Touch flash progress per frame.
const TOUCH_STEP: f32 = 0.02;
const FRAME_ALPHA: u8 = 255;
/// Distance threshold change per key press, in millimetres.
pub const THRESHOLD_STEP_MM: f32 = 10.0;

/// Operator controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    ToggleBox,
    TogglePanel,
    TestTone,
    ThresholdDown,
    ThresholdUp,
}

/// Values shown in the status line and the parameter panel.
#[derive(Debug, Clone)]
pub struct Status {
    pub trigger: Trigger,
    pub gains: GainSummary,
    pub distance_threshold_mm: f32,
    pub enter_threshold: f32,
    pub source: String,
    pub panel_enabled: bool,
    pub box_enabled: bool,
    pub camera: (Point3<f32>, Point3<f32>),
    pub write_head: usize,
    pub time_slices: usize,
    /// Loudest bin of the newest past slice
    pub past_peak: f32,
    /// Highest contour column, -1 when nobody is in range
    pub contour_peak: f32,
    pub scanner_angle: f32,
    pub scanner_fill: u8,
}

pub struct Installation {
    engine: Box<dyn SynthEngine>,
    source: Box<dyn DepthSource>,
    /// Most recent depth frame, drawn as the point cloud
    depth_frame: Option<DepthFrame>,
    point_step: usize,

    past: RingHistory,
    future: RingHistory,
    past_vertices: VertexBuffer,
    future_vertices: VertexBuffer,
    transform: AgeTransform,
    past_slice: Vec<f32>,
    future_slice: Vec<f32>,

    contour: GainContour,
    gains: Vec<f32>,
    summary: GainSummary,
    trigger_state: TriggerState,
    trigger: Trigger,

    scanner: Scanner,
    camera: OrbitCamera,
    manual_pose: (Point3<f32>, Point3<f32>),
    touch: Tween<f32>,

    distance_threshold_mm: f32,
    enter_threshold: f32,
    panel_enabled: bool,
    box_enabled: bool,
}

impl Installation {
    /// Builds the installation and allocates both ribbons.
    ///
    /// # Errors
    /// - If a ribbon cannot be allocated
    pub fn new(
        config: &DepthwaveConfig,
        engine: Box<dyn SynthEngine>,
        source: Box<dyn DepthSource>,
    ) -> anyhow::Result<Self> {
        let display = &config.display;
        let mut past = RingHistory::new(display.time_slices, display.bins, Direction::Forward)
            .context("Failed to allocate past spectrogram")?;
        let mut future = RingHistory::new(display.time_slices, display.bins, Direction::Reverse)
            .context("Failed to allocate future spectrogram")?;

        // Upload the flat baseline so the ribbons show before the first frame
        let mut past_vertices = VertexBuffer::default();
        let mut future_vertices = VertexBuffer::default();
        past_vertices.sync(&mut past);
        future_vertices.sync(&mut future);
        let transform = AgeTransform::new(
            display.distance_between_lines,
            display.line_spread,
            display.time_slices,
        );

        tracing::info!(
            "Installation ready: {} slices x {} bins, sensor {}x{}, source {}",
            config.display.time_slices,
            config.display.bins,
            config.sensor.width,
            config.sensor.height,
            source.name()
        );

        Ok(Self {
            engine,
            source,
            depth_frame: None,
            point_step: config.sensor.point_step,
            past,
            future,
            past_vertices,
            future_vertices,
            transform,
            past_slice: vec![0.0; display.bins],
            future_slice: vec![0.0; display.bins],
            contour: GainContour::new(config.sensor.width),
            gains: vec![0.0; display.bins],
            summary: GainSummary::default(),
            trigger_state: TriggerState::default(),
            trigger: Trigger::Stay,
            scanner: Scanner::new(1.0, -1.0),
            camera: OrbitCamera::new(&config.camera),
            manual_pose: (
                Point3::from(config.camera.eye_from),
                Point3::from(config.camera.look_at_from),
            ),
            touch: Tween::new(0.0).with_curve(Curve::EaseOut).with_duration(1.0),
            distance_threshold_mm: config.sensor.distance_threshold_mm,
            enter_threshold: config.sensor.enter_threshold,
            panel_enabled: false,
            box_enabled: false,
        })
    }

    /// Runs one frame of the sonification loop.
    ///
    /// # Errors
    /// - If the depth source fails
    /// - If a spectrum slice does not fit the ribbons
    pub fn update(&mut self) -> anyhow::Result<Trigger> {
        // Gain contour into the engine, edge trigger from its sum
        self.summary = self.contour.gains(&mut self.gains);
        self.trigger = self
            .trigger_state
            .step(self.summary.sum, self.enter_threshold);
        self.engine.write_gain(&self.gains);

        if self.trigger == Trigger::Enter {
            self.touch.reset(0.0);
            self.touch.animate_to(1.0);
        }

        self.scanner
            .update(fill_alpha(self.summary.average), FRAME_ALPHA);

        self.camera.update();
        self.camera.set_manual(self.panel_enabled.then_some(self.manual_pose));

        self.engine.read_past(&mut self.past_slice);
        self.engine.read_future(&mut self.future_slice);
        self.past.advance(&self.past_slice)?;
        self.future.advance(&self.future_slice)?;
        self.past_vertices.sync(&mut self.past);
        self.future_vertices.sync(&mut self.future);

        if self.touch.is_animating() {
            self.touch.update(TOUCH_STEP);
        }

        if let Some(frame) = self.source.poll()? {
            self.contour.reset();
            project_frame(&frame, &mut self.contour, self.distance_threshold_mm);
            self.depth_frame = Some(frame);
        }

        Ok(self.trigger)
    }

    /// Applies an operator control.
    pub fn apply(&mut self, control: Control) {
        match control {
            Control::ToggleBox => self.box_enabled = !self.box_enabled,
            Control::TogglePanel => self.panel_enabled = !self.panel_enabled,
            Control::TestTone => self.engine.bang("testTone"),
            Control::ThresholdDown => {
                self.distance_threshold_mm =
                    (self.distance_threshold_mm - THRESHOLD_STEP_MM).max(THRESHOLD_STEP_MM);
            }
            Control::ThresholdUp => self.distance_threshold_mm += THRESHOLD_STEP_MM,
        }
        tracing::debug!("Control {:?} applied", control);
    }

    /// World-space display list for the current state, in paint order.
    pub fn segments(&self) -> Vec<Segment> {
        let mut out = Vec::new();

        if let Some(frame) = &self.depth_frame {
            let threshold = self.distance_threshold_mm;
            scene::point_cloud(frame, threshold, self.point_step, &mut out);
        }

        if self.box_enabled {
            out.extend(scene::unit_box(Shade::new(WHITE, 0.6)));
        }

        scene::polyline(
            self.contour.points().map(|(x, y)| [x, y, 0.0]),
            Shade::new(LIGHT_BLUE, 1.0),
            &mut out,
        );

        scene::ribbon(
            &self.past,
            &self.past_vertices,
            &self.transform,
            WHITE,
            scene::in_place,
            &mut out,
        );
        scene::ribbon(
            &self.future,
            &self.future_vertices,
            &self.transform,
            FUTURE_GREY,
            scene::mirrored_below,
            &mut out,
        );

        out.extend(self.scanner.segments());

        if self.touch.is_animating() {
            out.extend(scene::touch_flash(self.touch.value()));
        }

        out
    }

    pub fn projector(&self, aspect: f32) -> Projector {
        self.camera.projector(aspect)
    }

    pub fn status(&self) -> Status {
        Status {
            trigger: self.trigger,
            gains: self.summary,
            distance_threshold_mm: self.distance_threshold_mm,
            enter_threshold: self.enter_threshold,
            source: self.source.name().to_string(),
            panel_enabled: self.panel_enabled,
            box_enabled: self.box_enabled,
            camera: self.camera.pose(),
            write_head: self.past.write_head(),
            time_slices: self.past.capacity(),
            past_peak: self
                .past
                .slice_by_age(0)
                .map(|slice| slice.iter().copied().fold(0.0, f32::max))
                .unwrap_or(0.0),
            contour_peak: self
                .contour
                .heights()
                .iter()
                .copied()
                .fold(BASELINE, f32::max),
            scanner_angle: self.scanner.angle(),
            scanner_fill: self.scanner.fill_alpha(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sonify::SimulatedDepth;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Engine that echoes the gain curve back as both spectra.
    struct EchoEngine {
        gains: Vec<f32>,
        bangs: Bangs,
    }

    impl SynthEngine for EchoEngine {
        fn write_gain(&mut self, gains: &[f32]) {
            self.gains = gains.to_vec();
        }

        fn read_past(&mut self, out: &mut [f32]) {
            crate::spectrogram::resample(&self.gains, out);
        }

        fn read_future(&mut self, out: &mut [f32]) {
            out.fill(0.5);
        }

        fn bang(&mut self, name: &str) {
            self.bangs.borrow_mut().push(name.to_string());
        }
    }

    /// Source that always reports a body right in front of the sensor.
    struct NearWall;

    impl DepthSource for NearWall {
        fn poll(&mut self) -> anyhow::Result<Option<DepthFrame>> {
            Ok(Some(DepthFrame::filled(16, 4, 100)))
        }

        fn name(&self) -> &str {
            "near wall"
        }
    }

    fn config() -> DepthwaveConfig {
        let mut config = DepthwaveConfig::default();
        config.display.time_slices = 6;
        config.display.bins = 8;
        config.sensor.width = 16;
        config.sensor.height = 4;
        config.sensor.enter_threshold = 4.0;
        config.sensor.point_step = 4;
        config
    }

    type Bangs = Rc<RefCell<Vec<String>>>;

    fn installation(source: Box<dyn DepthSource>) -> (Installation, Bangs) {
        let bangs = Rc::new(RefCell::new(Vec::new()));
        let engine = EchoEngine {
            gains: Vec::new(),
            bangs: bangs.clone(),
        };
        let installation = Installation::new(&config(), Box::new(engine), source).unwrap();
        (installation, bangs)
    }

    #[test]
    fn test_each_update_advances_both_ribbons() {
        let (mut installation, _) = installation(Box::new(SimulatedDepth::new(16, 4)));
        for n in 1..=9 {
            installation.update().unwrap();
            assert_eq!(installation.past.write_head(), n % 6);
            assert_eq!(installation.future.write_head(), n % 6);
        }
        assert_eq!(installation.future.slice_by_age(0).unwrap(), &[0.5; 8]);
    }

    #[test]
    fn test_body_in_range_triggers_enter_then_stays() {
        let (mut installation, _) = installation(Box::new(NearWall));

        // First frame reads an empty contour, the depth frame lands afterwards
        assert_eq!(installation.update().unwrap(), Trigger::Exit);
        assert_eq!(installation.update().unwrap(), Trigger::Enter);
        assert_eq!(installation.update().unwrap(), Trigger::Stay);

        let status = installation.status();
        assert!(status.gains.sum > 4.0);
        assert!(status.gains.average > 0.8);
        // The gain curve was echoed into the newest past slice
        assert!(installation.past.slice_by_age(0).unwrap().iter().all(|&g| g > 0.8));
        assert!(status.past_peak > 0.8);
        assert!(status.contour_peak > 0.8);
    }

    #[test]
    fn test_enter_starts_touch_flash() {
        let (mut installation, _) = installation(Box::new(NearWall));
        installation.update().unwrap();
        let before = installation.segments().len();
        installation.update().unwrap();
        assert_eq!(installation.segments().len(), before + 4);
    }

    #[test]
    fn test_controls() {
        let (mut installation, bangs) = installation(Box::new(NearWall));
        let threshold = installation.status().distance_threshold_mm;

        installation.apply(Control::ThresholdUp);
        assert_eq!(installation.status().distance_threshold_mm, threshold + THRESHOLD_STEP_MM);
        installation.apply(Control::ThresholdDown);
        installation.apply(Control::ThresholdDown);
        assert_eq!(installation.status().distance_threshold_mm, threshold - THRESHOLD_STEP_MM);

        installation.apply(Control::TestTone);
        assert_eq!(bangs.borrow().as_slice(), &["testTone".to_string()]);

        let plain = installation.segments().len();
        installation.apply(Control::ToggleBox);
        assert_eq!(installation.segments().len(), plain + 12);
    }

    #[test]
    fn test_panel_pins_camera() {
        let (mut installation, _) = installation(Box::new(NearWall));
        installation.apply(Control::TogglePanel);
        installation.update().unwrap();
        let pinned = installation.status().camera;
        for _ in 0..20 {
            installation.update().unwrap();
        }
        assert_eq!(installation.status().camera, pinned);
    }

    #[test]
    fn test_display_list_contains_both_ribbons() {
        let (mut installation, _) = installation(Box::new(NearWall));
        installation.update().unwrap();
        let segments = installation.segments();
        // contour (15) + two ribbons of 6 strips x 7 segments + scanner
        let ribbon_segments = 6 * 7;
        assert!(segments.len() >= 15 + 2 * ribbon_segments);
        // The future ribbon's 0.5 slice hangs below the floor after mirroring
        assert!(segments.iter().any(|s| (s.from[1] + 1.5).abs() < 1e-5));
    }

    #[test]
    fn test_point_cloud_is_drawn_first_from_latest_frame() {
        let (mut installation, _) = installation(Box::new(NearWall));
        let empty = installation.segments().len();

        installation.update().unwrap();
        let segments = installation.segments();
        // 16x4 frame at stride 4: columns 0, 4, 8, 12 on row 0
        assert_eq!(segments.len(), empty + 4);
        assert!(segments[..4].iter().all(|s| s.to[0] - s.from[0] > 0.0 && s.from[1] == 1.0));

        // Out of range once the threshold drops below the wall
        for _ in 0..200 {
            installation.apply(Control::ThresholdDown);
        }
        assert_eq!(installation.segments().len(), empty);
    }
}
