/// A closed range of ray parameters (or coordinates along one axis).
///
/// Used both to cull intersections by distance and as the per-axis slab of an
/// [`Aabb`](crate::Aabb).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Contains nothing: `min = +inf`, `max = -inf`.
    pub const EMPTY: Interval = Interval {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };

    /// Contains every value.
    pub const UNIVERSE: Interval = Interval {
        min: f32::NEG_INFINITY,
        max: f32::INFINITY,
    };

    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// `max - min`. Negative for [`Interval::EMPTY`].
    pub fn size(&self) -> f32 {
        self.max - self.min
    }

    /// True when no value lies strictly between the bounds.
    pub fn is_empty(&self) -> bool {
        self.max <= self.min
    }

    /// Closed test: `min <= x <= max`.
    pub fn contains(&self, x: f32) -> bool {
        self.min <= x && x <= self.max
    }

    /// Open test: `min < x < max`.
    pub fn surrounds(&self, x: f32) -> bool {
        self.min < x && x < self.max
    }

    pub fn clamp(&self, x: f32) -> f32 {
        x.clamp(self.min, self.max)
    }

    /// Pads the interval by `delta / 2` on each side.
    pub fn expand(&self, delta: f32) -> Interval {
        let padding = delta / 2.0;
        Interval::new(self.min - padding, self.max + padding)
    }

    /// Shifts both bounds by `displacement`.
    pub fn add_scalar(&self, displacement: f32) -> Interval {
        Interval::new(self.min + displacement, self.max + displacement)
    }

    /// Smallest interval enclosing both `a` and `b`.
    pub fn surrounding(a: &Interval, b: &Interval) -> Interval {
        Interval::new(a.min.min(b.min), a.max.max(b.max))
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_and_emptiness() {
        assert_eq!(Interval::new(2.0, 7.0).size(), 5.0);
        assert!(!Interval::new(2.0, 7.0).is_empty());
        assert!(Interval::new(3.0, 3.0).is_empty());
        assert!(Interval::EMPTY.is_empty());
        assert!(!Interval::UNIVERSE.is_empty());
    }

    #[test]
    fn test_contains_is_closed() {
        let interval = Interval::new(0.0, 10.0);
        assert!(interval.contains(0.0));
        assert!(interval.contains(10.0));
        assert!(!interval.contains(-0.1));
        assert!(!interval.contains(10.1));
    }

    #[test]
    fn test_surrounds_is_open() {
        let interval = Interval::new(0.0, 10.0);
        assert!(!interval.surrounds(0.0));
        assert!(!interval.surrounds(10.0));
        assert!(interval.surrounds(0.1));
        assert!(interval.surrounds(9.9));
    }

    #[test]
    fn test_clamp() {
        let unit = Interval::new(0.0, 1.0);
        assert_eq!(unit.clamp(-5.0), 0.0);
        assert_eq!(unit.clamp(0.25), 0.25);
        assert_eq!(unit.clamp(3.0), 1.0);
    }

    #[test]
    fn test_expand_pads_symmetrically() {
        let expanded = Interval::new(0.0, 10.0).expand(4.0);
        assert_eq!(expanded, Interval::new(-2.0, 12.0));
    }

    #[test]
    fn test_add_scalar() {
        assert_eq!(Interval::new(1.0, 2.0).add_scalar(3.0), Interval::new(4.0, 5.0));
    }

    #[test]
    fn test_surrounding_with_empty_is_identity() {
        let a = Interval::new(-1.0, 4.0);
        assert_eq!(Interval::surrounding(&a, &Interval::EMPTY), a);
        assert_eq!(
            Interval::surrounding(&a, &Interval::new(2.0, 9.0)),
            Interval::new(-1.0, 9.0)
        );
    }

    #[test]
    fn test_empty_contains_nothing() {
        assert!(!Interval::EMPTY.contains(0.0));
        assert!(!Interval::EMPTY.surrounds(f32::INFINITY));
        assert!(Interval::UNIVERSE.contains(1e30));
    }
}
