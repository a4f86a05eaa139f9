use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::SEPARATION_EPSILON;

/// Axis-aligned placement rectangle. Always has positive width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormationArea {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl FormationArea {
    /// `None` for empty, inverted or non-finite rectangles.
    pub fn new(min_x: f32, max_x: f32, min_y: f32, max_y: f32) -> Option<Self> {
        let finite = [min_x, max_x, min_y, max_y].iter().all(|v| v.is_finite());
        if finite && max_x > min_x && max_y > min_y {
            Some(Self {
                min_x,
                max_x,
                min_y,
                max_y,
            })
        } else {
            None
        }
    }

    pub fn from_center(center: Vec2, half_width: f32, half_height: f32) -> Option<Self> {
        Self::new(
            center.x - half_width,
            center.x + half_width,
            center.y - half_height,
            center.y + half_height,
        )
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width() / self.height()
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    pub fn min_side(&self) -> f32 {
        self.width().min(self.height())
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min_x - SEPARATION_EPSILON
            && point.x <= self.max_x + SEPARATION_EPSILON
            && point.y >= self.min_y - SEPARATION_EPSILON
            && point.y <= self.max_y + SEPARATION_EPSILON
    }

    /// Shrinks every side by `margin`; `None` if nothing would be left.
    pub fn inset(&self, margin: f32) -> Option<Self> {
        Self::new(
            self.min_x + margin,
            self.max_x - margin,
            self.min_y + margin,
            self.max_y - margin,
        )
    }

    /// Shrinks by `margin` where possible, otherwise collapses toward the
    /// centre while keeping a sliver of the original extent.
    pub fn inset_or_center(&self, margin: f32) -> Self {
        let mx = margin.min(self.width() * 0.49);
        let my = margin.min(self.height() * 0.49);
        Self {
            min_x: self.min_x + mx,
            max_x: self.max_x - mx,
            min_y: self.min_y + my,
            max_y: self.max_y - my,
        }
    }

    pub fn intersection(&self, other: &FormationArea) -> Option<Self> {
        Self::new(
            self.min_x.max(other.min_x),
            self.max_x.min(other.max_x),
            self.min_y.max(other.min_y),
            self.max_y.min(other.max_y),
        )
    }

    /// Distance between the two rectangles' closest edges; zero when they
    /// touch or overlap.
    pub fn gap_to(&self, other: &FormationArea) -> f32 {
        let dx = (other.min_x - self.max_x).max(self.min_x - other.max_x).max(0.0);
        let dy = (other.min_y - self.max_y).max(self.min_y - other.max_y).max(0.0);
        (dx * dx + dy * dy).sqrt()
    }

    /// Same centre with width and height swapped.
    pub fn quarter_turn(&self) -> Self {
        let center = self.center();
        let half_w = self.height() * 0.5;
        let half_h = self.width() * 0.5;
        Self {
            min_x: center.x - half_w,
            max_x: center.x + half_w,
            min_y: center.y - half_h,
            max_y: center.y + half_h,
        }
    }

    pub fn clamp_point(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(self.min_x, self.max_x),
            point.y.clamp(self.min_y, self.max_y),
        )
    }

    pub fn random_point<R: Rng>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(
            rng.gen_range(self.min_x..=self.max_x),
            rng.gen_range(self.min_y..=self.max_y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f32, max: f32) -> FormationArea {
        FormationArea::new(min, max, min, max).unwrap()
    }

    #[test]
    fn rejects_degenerate_rectangles() {
        assert!(FormationArea::new(0.0, 0.0, 0.0, 1.0).is_none());
        assert!(FormationArea::new(1.0, 0.0, 0.0, 1.0).is_none());
        assert!(FormationArea::new(0.0, f32::NAN, 0.0, 1.0).is_none());
    }

    #[test]
    fn inset_and_contains() {
        let area = square(-5.0, 5.0);
        let inner = area.inset(1.0).unwrap();
        assert_eq!(inner.width(), 8.0);
        assert!(area.contains(Vec2::new(5.0, -5.0)));
        assert!(!inner.contains(Vec2::new(4.5, 0.0)));
        assert!(area.inset(5.0).is_none());

        let collapsed = area.inset_or_center(10.0);
        assert!(collapsed.width() > 0.0);
        assert_eq!(collapsed.center(), area.center());
    }

    #[test]
    fn gap_between_rectangles() {
        let a = square(0.0, 1.0);
        let b = FormationArea::new(3.0, 4.0, 0.0, 1.0).unwrap();
        assert_eq!(a.gap_to(&b), 2.0);
        assert_eq!(b.gap_to(&a), 2.0);
        let c = FormationArea::new(0.5, 2.0, 0.5, 2.0).unwrap();
        assert_eq!(a.gap_to(&c), 0.0);
        let diagonal = FormationArea::new(4.0, 5.0, 5.0, 6.0).unwrap();
        assert_eq!(a.gap_to(&diagonal), 5.0);
    }

    #[test]
    fn quarter_turn_swaps_extent() {
        let area = FormationArea::new(0.0, 10.0, 0.0, 4.0).unwrap();
        let turned = area.quarter_turn();
        assert_eq!(turned.width(), 4.0);
        assert_eq!(turned.height(), 10.0);
        assert_eq!(turned.center(), area.center());
    }

    #[test]
    fn intersection_of_disjoint_is_none() {
        let a = square(0.0, 1.0);
        let b = square(2.0, 3.0);
        assert!(a.intersection(&b).is_none());
        assert_eq!(a.intersection(&square(0.5, 3.0)).unwrap().width(), 0.5);
    }
}
