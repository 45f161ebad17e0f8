use glam::Vec3;

/// Follows a polyline rail by arc length.
#[derive(Debug, Clone, PartialEq)]
pub struct RailRider {
    points: Vec<Vec3>,
    closed: bool,
    lengths: Vec<f32>,
    total_length: f32,
    pub coord: f32,
    pub speed: f32,
    /// `true` when moving towards the last point.
    pub direction: bool,
}

impl RailRider {
    /// Returns `None` when fewer than two points are supplied.
    pub fn new(points: Vec<Vec3>, closed: bool) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let segment_count = if closed { points.len() } else { points.len() - 1 };
        let lengths: Vec<f32> = (0..segment_count)
            .map(|i| points[i].distance(points[(i + 1) % points.len()]))
            .collect();
        let total_length = lengths.iter().sum();
        Some(Self {
            points,
            closed,
            lengths,
            total_length,
            coord: 0.0,
            speed: 0.0,
            direction: true,
        })
    }

    pub fn total_length(&self) -> f32 {
        self.total_length
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Advances `coord` by `speed` in the current direction. Closed rails
    /// wrap; open rails stop at their ends.
    pub fn move_along(&mut self) {
        let step = if self.direction { self.speed } else { -self.speed };
        self.set_coord(self.coord + step);
    }

    pub fn set_coord(&mut self, coord: f32) {
        self.coord = if self.closed && self.total_length > 0.0 {
            coord.rem_euclid(self.total_length)
        } else {
            coord.clamp(0.0, self.total_length)
        };
    }

    pub fn reverse(&mut self) {
        self.direction = !self.direction;
    }

    pub fn is_reached_goal(&self) -> bool {
        if self.closed {
            return false;
        }
        if self.direction {
            self.coord >= self.total_length
        } else {
            self.coord <= 0.0
        }
    }

    pub fn current_pos(&self) -> Vec3 {
        self.pos_at(self.coord)
    }

    pub fn pos_at(&self, coord: f32) -> Vec3 {
        let mut remaining = coord;
        for (i, length) in self.lengths.iter().enumerate() {
            if remaining <= *length {
                let start = self.points[i];
                let end = self.points[(i + 1) % self.points.len()];
                let t = if *length > 0.0 { remaining / length } else { 0.0 };
                return start.lerp(end, t);
            }
            remaining -= length;
        }
        if self.closed {
            self.points[0]
        } else {
            self.points[self.points.len() - 1]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn l_rail(closed: bool) -> RailRider {
        RailRider::new(
            vec![
                Vec3::ZERO,
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(10.0, 0.0, 10.0),
            ],
            closed,
        )
        .unwrap()
    }

    #[test]
    fn open_rail_stops_at_goal() {
        let mut rider = l_rail(false);
        rider.speed = 8.0;
        rider.move_along();
        assert_eq!(rider.current_pos(), Vec3::new(8.0, 0.0, 0.0));
        rider.move_along();
        assert!(rider
            .current_pos()
            .abs_diff_eq(Vec3::new(10.0, 0.0, 6.0), 1e-4));
        rider.move_along();
        assert!(rider.is_reached_goal());
        assert_eq!(rider.current_pos(), Vec3::new(10.0, 0.0, 10.0));
    }

    #[test]
    fn closed_rail_wraps() {
        let mut rider = l_rail(true);
        let total = rider.total_length();
        rider.set_coord(total + 5.0);
        assert!(rider
            .current_pos()
            .abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-4));
        assert!(!rider.is_reached_goal());
    }

    #[test]
    fn needs_two_points() {
        assert!(RailRider::new(vec![Vec3::ONE], false).is_none());
    }
}
