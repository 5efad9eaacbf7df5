//! Full-screen calibration guide built on Iced.
//!
//! The window polls the last known cursor position at a fixed interval and
//! feeds it into a [`CalibrationSession`], drawing the current target on a
//! translucent backdrop.

use std::time::Instant;

use iced::alignment;
use iced::event::{self, Event};
use iced::font::{self, Font};
use iced::mouse;
use iced::widget::canvas::{self, Canvas, Frame, Geometry, Path, Text};
use iced::window;
use iced::{
    Color, Element, Length, Pixels, Point, Rectangle, Renderer, Size, Subscription, Task, Theme,
};

use crate::calibration::{Axis, CalibrationSession};
use crate::settings::AppSettings;

use super::logger::SessionLog;

const BACKDROP: Color = Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 180.0 / 255.0,
};
const TARGET_COLOR: Color = Color {
    r: 0.0,
    g: 242.0 / 255.0,
    b: 254.0 / 255.0,
    a: 1.0,
};
const COMPLETE_COLOR: Color = Color {
    r: 0.0,
    g: 1.0,
    b: 127.0 / 255.0,
    a: 1.0,
};
const ERROR_COLOR: Color = Color {
    r: 1.0,
    g: 90.0 / 255.0,
    b: 90.0 / 255.0,
    a: 1.0,
};
const TARGET_RADIUS: f32 = 20.0;
const TARGET_CORE_RADIUS: f32 = 6.0;

/// Messages for the guide window.
#[derive(Debug, Clone)]
pub enum Message {
    Tick(Instant),
    CursorMoved(Point),
    Resized(Size),
    Close,
}

/// Guide window state.
pub struct CalibrationApp {
    settings: AppSettings,
    session: Option<CalibrationSession>,
    cursor: Option<Point>,
    log: SessionLog,
    error: Option<String>,
    closing: bool,
}

impl CalibrationApp {
    /// Create the application and switch its window to fullscreen.
    pub fn new() -> (Self, Task<Message>) {
        let settings = AppSettings::load();
        let mut log = SessionLog::new();
        match AppSettings::write_defaults_if_missing() {
            Ok(Some(path)) => log.info(format!("Wrote default settings to {}", path.display())),
            Ok(None) => {}
            Err(e) => tracing::warn!("Could not write default settings: {}", e),
        }
        log.info(format!(
            "Calibration guide started (dwell {:.2}s, poll {}ms, {:?})",
            settings.dwell_time_secs, settings.poll_interval_ms, settings.sampling_mode
        ));

        let app = Self {
            settings,
            session: None,
            cursor: None,
            log,
            error: None,
            closing: false,
        };

        let fullscreen = window::get_oldest()
            .and_then(|id| window::change_mode(id, window::Mode::Fullscreen));

        (app, fullscreen)
    }

    pub fn title(&self) -> String {
        "Gaze Calibration".to_string()
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    /// Transparent root so the backdrop alpha shows the desktop underneath.
    pub fn style(&self, _theme: &Theme) -> iced::application::Appearance {
        iced::application::Appearance {
            background_color: Color::TRANSPARENT,
            text_color: Color::WHITE,
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Resized(size) => {
                self.on_resize(size);
                Task::none()
            }
            Message::CursorMoved(position) => {
                self.cursor = Some(position);
                Task::none()
            }
            Message::Tick(now) => self.on_tick(now),
            Message::Close => window::get_latest().and_then(window::close),
        }
    }

    /// Geometry may change while the window settles into fullscreen, so the
    /// session is rebuilt until the first fixation has been accepted.
    fn on_resize(&mut self, size: Size) {
        let width = size.width.max(0.0).round() as u32;
        let height = size.height.max(0.0).round() as u32;

        if let Some(session) = &self.session {
            if session.current_step() > 0 || session.screen_size() == (width, height) {
                return;
            }
        }

        let session = self
            .settings
            .calibration_config()
            .and_then(|config| CalibrationSession::new(width, height, config));
        match session {
            Ok(session) => {
                self.log.info(format!("Screen geometry {}x{}", width, height));
                self.session = Some(session);
                self.error = None;
            }
            Err(e) => {
                tracing::error!("Cannot start calibration: {}", e);
                self.log.error(e.to_string());
                self.session = None;
                self.error = Some(e.to_string());
            }
        }
    }

    fn on_tick(&mut self, now: Instant) -> Task<Message> {
        if self.closing {
            return Task::none();
        }
        let (Some(session), Some(cursor)) = (self.session.as_mut(), self.cursor) else {
            return Task::none();
        };

        let target = session.current_target();
        if !session.record((cursor.x as f64, cursor.y as f64), now) {
            return Task::none();
        }

        if let Some(target) = target {
            self.log.fixation(format!(
                "{} accepted at ({:.0}, {:.0})",
                target, cursor.x, cursor.y
            ));
        }
        if !session.is_completed() {
            return Task::none();
        }

        if let Some(mapping) = session.mapping() {
            for axis in [Axis::X, Axis::Y] {
                let fit = mapping.fit_for(axis);
                let line = format!(
                    "{}-Coeff: [{:.6}, {:.6}]",
                    axis.to_string().to_uppercase(),
                    fit.slope,
                    fit.intercept
                );
                println!("{}", line);
                self.log.success(line);
            }
        } else if let Some(e) = session.fit_error() {
            self.log.error(format!("Fit failed: {}", e));
            self.error = Some(e.to_string());
        }

        self.closing = true;
        let delay = self.settings.close_delay();
        Task::perform(
            async move { tokio::time::sleep(delay).await },
            |_| Message::Close,
        )
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let events = event::listen_with(|event, _status, _window| match event {
            Event::Mouse(mouse::Event::CursorMoved { position }) => {
                Some(Message::CursorMoved(position))
            }
            Event::Window(window::Event::Opened { size, .. }) => Some(Message::Resized(size)),
            Event::Window(window::Event::Resized(size)) => Some(Message::Resized(size)),
            _ => None,
        });

        if self.closing {
            return events;
        }

        Subscription::batch([
            events,
            iced::time::every(self.settings.poll_interval()).map(Message::Tick),
        ])
    }

    pub fn view(&self) -> Element<'_, Message> {
        Canvas::new(self.overlay())
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn overlay(&self) -> GuideOverlay {
        if let Some(error) = &self.error {
            return GuideOverlay::Failed(error.clone());
        }
        let Some(session) = &self.session else {
            return GuideOverlay::Waiting;
        };
        match session.current_target() {
            Some(target) => {
                let (x, y) = session.screen_point(target);
                GuideOverlay::Target {
                    position: Point::new(x as f32, y as f32),
                    label: target.label(),
                }
            }
            None => GuideOverlay::Complete,
        }
    }
}

/// What the canvas shows for the current frame.
#[derive(Debug, Clone)]
enum GuideOverlay {
    Waiting,
    Target { position: Point, label: &'static str },
    Complete,
    Failed(String),
}

fn caption(content: String, position: Point, color: Color, size: f32) -> Text {
    Text {
        content,
        position,
        color,
        size: Pixels(size),
        font: Font {
            weight: font::Weight::Bold,
            ..Font::DEFAULT
        },
        horizontal_alignment: alignment::Horizontal::Center,
        vertical_alignment: alignment::Vertical::Center,
        ..Text::default()
    }
}

impl canvas::Program<Message> for GuideOverlay {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), BACKDROP);
        let center = frame.center();

        match self {
            GuideOverlay::Waiting => {}
            GuideOverlay::Target { position, label } => {
                frame.fill(&Path::circle(*position, TARGET_RADIUS), TARGET_COLOR);
                frame.fill(&Path::circle(*position, TARGET_CORE_RADIUS), Color::WHITE);
                frame.fill_text(caption(
                    format!("DWELL ON THE {} DOT", label),
                    center,
                    Color::WHITE,
                    24.0,
                ));
            }
            GuideOverlay::Complete => {
                frame.fill_text(caption(
                    "CALIBRATION COMPLETE ✅".to_string(),
                    center,
                    COMPLETE_COLOR,
                    32.0,
                ));
            }
            GuideOverlay::Failed(error) => {
                frame.fill_text(caption(
                    format!("CALIBRATION FAILED: {}", error),
                    center,
                    ERROR_COLOR,
                    24.0,
                ));
            }
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn app() -> CalibrationApp {
        CalibrationApp {
            settings: AppSettings {
                dwell_time_secs: 0.1,
                ..AppSettings::default()
            },
            session: None,
            cursor: None,
            log: SessionLog::default(),
            error: None,
            closing: false,
        }
    }

    #[test]
    fn test_guide_walks_all_targets() {
        let mut app = app();
        assert!(matches!(app.overlay(), GuideOverlay::Waiting));

        let _ = app.update(Message::Resized(Size::new(1000.0, 800.0)));
        match app.overlay() {
            GuideOverlay::Target { position, label } => {
                assert_eq!(position, Point::new(50.0, 50.0));
                assert_eq!(label, "TOP LEFT");
            }
            other => panic!("unexpected overlay {:?}", other),
        }

        let gaze = [(35.0, 35.0), (485.0, 35.0), (35.0, 385.0), (485.0, 385.0), (260.0, 210.0)];
        let t0 = Instant::now();
        for (step, (x, y)) in gaze.into_iter().enumerate() {
            let start = t0 + Duration::from_millis(step as u64 * 200);
            let _ = app.update(Message::CursorMoved(Point::new(x, y)));
            let _ = app.update(Message::Tick(start));
            let _ = app.update(Message::Tick(start + Duration::from_millis(100)));
        }

        assert!(app.closing);
        assert!(matches!(app.overlay(), GuideOverlay::Complete));
        let (slope, intercept) = app.session.as_ref().unwrap().coeff_x().unwrap();
        assert!((slope - 2.0).abs() < 1e-6);
        assert!((intercept + 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_ticks_without_cursor_are_ignored() {
        let mut app = app();
        let _ = app.update(Message::Resized(Size::new(1000.0, 800.0)));
        let _ = app.update(Message::Tick(Instant::now()));
        assert!(!app.session.as_ref().unwrap().is_dwelling());
    }

    #[test]
    fn test_resize_rebuilds_until_first_fixation() {
        let mut app = app();
        let _ = app.update(Message::Resized(Size::new(800.0, 600.0)));
        let _ = app.update(Message::Resized(Size::new(1920.0, 1080.0)));
        assert_eq!(app.session.as_ref().unwrap().screen_size(), (1920, 1080));

        let t0 = Instant::now();
        let _ = app.update(Message::CursorMoved(Point::new(10.0, 10.0)));
        let _ = app.update(Message::Tick(t0));
        let _ = app.update(Message::Tick(t0 + Duration::from_millis(100)));
        assert_eq!(app.session.as_ref().unwrap().current_step(), 1);

        let _ = app.update(Message::Resized(Size::new(1280.0, 720.0)));
        assert_eq!(app.session.as_ref().unwrap().screen_size(), (1920, 1080));
    }

    #[test]
    fn test_invalid_dwell_reports_error() {
        let mut app = app();
        app.settings.dwell_time_secs = -1.0;
        let _ = app.update(Message::Resized(Size::new(1000.0, 800.0)));
        assert!(app.session.is_none());
        assert!(matches!(app.overlay(), GuideOverlay::Failed(_)));
    }

    #[test]
    fn test_tiny_window_reports_error() {
        let mut app = app();
        let _ = app.update(Message::Resized(Size::new(60.0, 60.0)));
        assert!(app.session.is_none());
        assert!(matches!(app.overlay(), GuideOverlay::Failed(_)));
    }
}
