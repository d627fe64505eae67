use iced::widget::canvas::{self, Path, Stroke};
use iced::widget::container;
use iced::{Color, Element, Length, Point, Rectangle, Size, Theme, mouse};

/// Converts an x coordinate in seek bar space to a position in seconds.
///
/// The left edge maps to `0.0` and the right edge to `duration`. Positions
/// outside the widget are clamped.
///
/// # Example
///
/// ```ignore
/// assert_eq!(seconds_from_x(0.0, 200.0, 60.0), 0.0);
/// assert_eq!(seconds_from_x(100.0, 200.0, 60.0), 30.0);
/// assert_eq!(seconds_from_x(250.0, 200.0, 60.0), 60.0);
/// ```
pub fn seconds_from_x(x: f32, width: f32, duration: f64) -> f64 {
    if duration <= 0.0 || width <= 0.0 {
        return 0.0;
    }

    let ratio = f64::from(x.clamp(0.0, width) / width);
    ratio * duration
}

fn x_from_seconds(position: f64, duration: f64, width: f32) -> f32 {
    if duration <= 0.0 {
        return 0.0;
    }

    let ratio = (position / duration).clamp(0.0, 1.0);
    ratio as f32 * width
}

#[derive(Debug, Default)]
struct SeekBarState {
    dragging: bool,
}

#[derive(Debug)]
struct SeekBarProgram<Message> {
    position: f64,
    duration: f64,
    on_seek: Option<fn(f64) -> Message>,
}

impl<Message> SeekBarProgram<Message> {
    fn is_interactive(&self) -> bool {
        self.on_seek.is_some() && self.duration > 0.0
    }

    fn seek_to(&self, x: f32, width: f32) -> Option<Message> {
        self.on_seek
            .map(|on_seek| on_seek(seconds_from_x(x, width, self.duration)))
    }
}

impl<Message> canvas::Program<Message> for SeekBarProgram<Message> {
    type State = SeekBarState;

    fn update(
        &self,
        state: &mut Self::State,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (canvas::event::Status, Option<Message>) {
        if !self.is_interactive() {
            return (canvas::event::Status::Ignored, None);
        }

        let cursor_x = cursor.position().map(|position| position.x - bounds.x);
        match event {
            canvas::Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                let Some(x) = cursor_x.filter(|_| cursor.is_over(bounds)) else {
                    return (canvas::event::Status::Ignored, None);
                };
                state.dragging = true;
                (canvas::event::Status::Captured, self.seek_to(x, bounds.width))
            }
            canvas::Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) => {
                let was_dragging = state.dragging;
                state.dragging = false;
                if was_dragging {
                    (canvas::event::Status::Captured, None)
                } else {
                    (canvas::event::Status::Ignored, None)
                }
            }
            canvas::Event::Mouse(mouse::Event::CursorMoved { .. }) if state.dragging => {
                let Some(x) = cursor_x else {
                    return (canvas::event::Status::Ignored, None);
                };
                (canvas::event::Status::Captured, self.seek_to(x, bounds.width))
            }
            _ => (canvas::event::Status::Ignored, None),
        }
    }

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        frame.fill_rectangle(Point::ORIGIN, bounds.size(), Color::from_rgb8(22, 24, 29));

        let x = x_from_seconds(self.position, self.duration, bounds.width);
        if x > 0.0 {
            frame.fill_rectangle(
                Point::new(0.0, 6.0),
                Size::new(x, (bounds.height - 12.0).max(1.0)),
                Color::from_rgb8(55, 110, 188),
            );
        }

        if self.duration > 0.0 {
            let line = Path::line(Point::new(x, 0.0), Point::new(x, bounds.height));
            frame.stroke(
                &line,
                Stroke::default()
                    .with_width(2.0)
                    .with_color(Color::from_rgb8(255, 94, 77)),
            );
        }

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        _state: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if self.is_interactive() && cursor.is_over(bounds) {
            mouse::Interaction::Pointer
        } else {
            mouse::Interaction::None
        }
    }
}

/// Renders a progress bar. Clicking or dragging seeks when `on_seek` is set.
pub fn view<'a, Message>(
    position: f64,
    duration: f64,
    on_seek: Option<fn(f64) -> Message>,
) -> Element<'a, Message>
where
    Message: 'a,
{
    container(
        canvas::Canvas::new(SeekBarProgram {
            position,
            duration,
            on_seek,
        })
        .width(Length::Fill)
        .height(Length::Fixed(28.0)),
    )
    .width(Length::Fill)
    .into()
}
