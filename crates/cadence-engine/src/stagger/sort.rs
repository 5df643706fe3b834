use super::geometry::{Bounds, Vec2};

/// Something to animate, placed at `position`.
#[derive(Debug, Clone)]
pub struct Target<T> {
    pub item: T,
    pub position: Vec2,
}

impl<T> Target<T> {
    pub fn new(item: T, position: Vec2) -> Self {
        Self { item, position }
    }
}

/// A target's item with the delay before it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Timed<T> {
    pub item: T,
    pub delay_ms: u64,
}

/// Assigns start delays to a set of targets.
pub trait Stagger {
    /// Orders `targets` by start time and gives each its delay.
    ///
    /// The first target to start always has delay 0.
    fn schedule<T>(&self, targets: Vec<Target<T>>, bounds: Bounds) -> Vec<Timed<T>>;
}

/// Keeps the given order and spaces starts `interval_ms` apart.
#[derive(Debug, Copy, Clone)]
pub struct SequentialStagger {
    pub interval_ms: u64,
}

impl Stagger for SequentialStagger {
    fn schedule<T>(&self, targets: Vec<Target<T>>, _bounds: Bounds) -> Vec<Timed<T>> {
        targets
            .into_iter()
            .enumerate()
            .map(|(i, t)| Timed {
                item: t.item,
                delay_ms: self.interval_ms.saturating_mul(i as u64),
            })
            .collect()
    }
}

/// Reference point of a [`RadialStagger`] within the bounds.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Anchor {
    TopLeft,
    TopMiddle,
    TopRight,
    Left,
    Middle,
    Right,
    BottomLeft,
    BottomMiddle,
    BottomRight,
}

impl Anchor {
    pub fn point(self, bounds: Bounds) -> Vec2 {
        let (w, h) = (bounds.width, bounds.height);
        match self {
            Anchor::TopLeft => Vec2::new(0.0, 0.0),
            Anchor::TopMiddle => Vec2::new(w / 2.0, 0.0),
            Anchor::TopRight => Vec2::new(w, 0.0),
            Anchor::Left => Vec2::new(0.0, h / 2.0),
            Anchor::Middle => Vec2::new(w / 2.0, h / 2.0),
            Anchor::Right => Vec2::new(w, h / 2.0),
            Anchor::BottomLeft => Vec2::new(0.0, h),
            Anchor::BottomMiddle => Vec2::new(w / 2.0, h),
            Anchor::BottomRight => Vec2::new(w, h),
        }
    }
}

/// Ripples outward from the target nearest to `anchor`.
///
/// Targets at equal distance start together; each further ring starts
/// `interval_ms` after the previous one. `reversed` ripples inward instead.
#[derive(Debug, Copy, Clone)]
pub struct RadialStagger {
    pub interval_ms: u64,
    pub reversed: bool,
    pub anchor: Anchor,
}

impl Stagger for RadialStagger {
    fn schedule<T>(&self, targets: Vec<Target<T>>, bounds: Bounds) -> Vec<Timed<T>> {
        let anchor = self.anchor.point(bounds);
        let Some(origin) = targets
            .iter()
            .map(|t| t.position.rounded())
            .min_by(|a, b| a.distance(anchor).total_cmp(&b.distance(anchor)))
        else {
            return Vec::new();
        };

        by_distance(targets, self.interval_ms, self.reversed, |p| p.distance(origin))
    }
}

/// Sweep direction of a [`LinearStagger`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Direction {
    TopToBottom,
    BottomToTop,
    LeftToRight,
    RightToLeft,
}

/// Sweeps across the bounds; targets on the same row (or column) start together.
#[derive(Debug, Copy, Clone)]
pub struct LinearStagger {
    pub interval_ms: u64,
    pub reversed: bool,
    pub direction: Direction,
}

impl Stagger for LinearStagger {
    fn schedule<T>(&self, targets: Vec<Target<T>>, bounds: Bounds) -> Vec<Timed<T>> {
        let edge = match self.direction {
            Direction::TopToBottom => 0.0,
            Direction::BottomToTop => bounds.height,
            Direction::LeftToRight => 0.0,
            Direction::RightToLeft => bounds.width,
        };

        match self.direction {
            Direction::TopToBottom | Direction::BottomToTop => {
                by_distance(targets, self.interval_ms, self.reversed, |p| (p.y - edge).abs())
            }
            Direction::LeftToRight | Direction::RightToLeft => {
                by_distance(targets, self.interval_ms, self.reversed, |p| (p.x - edge).abs())
            }
        }
    }
}

/// Stable sort by `distance` of the rounded position, one delay step per distinct distance.
fn by_distance<T>(
    targets: Vec<Target<T>>,
    interval_ms: u64,
    reversed: bool,
    distance: impl Fn(Vec2) -> f32,
) -> Vec<Timed<T>> {
    let mut keyed: Vec<(f32, T)> = targets
        .into_iter()
        .map(|t| (distance(t.position.rounded()), t.item))
        .collect();

    if reversed {
        keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
    } else {
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
    }

    let mut delay_ms = 0u64;
    let mut last: Option<f32> = None;
    keyed
        .into_iter()
        .map(|(d, item)| {
            if last.is_some_and(|prev| prev != d) {
                delay_ms = delay_ms.saturating_add(interval_ms);
            }
            last = Some(d);
            Timed { item, delay_ms }
        })
        .collect()
}
