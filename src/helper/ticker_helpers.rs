use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Cyclic position over a list of `len` items (newsflash ticker, hero carousel).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Rotation {
    index: usize,
    len: usize,
}

pub type SharedRotation = Arc<RwLock<Rotation>>;

impl Rotation {
    pub fn new(len: usize) -> Self {
        Rotation { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The same rotation moved `offset` steps, negative offsets going back.
    pub fn offset_by(mut self, offset: i64) -> Rotation {
        if self.len > 0 {
            let shift = offset.rem_euclid(self.len as i64) as usize;
            self.index = (self.index + shift) % self.len;
        }
        self
    }

    /// Adopts a new list length, keeping the index in range.
    pub fn sync_len(&mut self, len: usize) {
        self.len = len;
        self.index = if len == 0 { 0 } else { self.index % len };
    }

    pub fn advance(&mut self) -> usize {
        if self.len > 0 {
            self.index = (self.index + 1) % self.len;
        }
        self.index
    }

    pub fn retreat(&mut self) -> usize {
        if self.len > 0 {
            self.index = (self.index + self.len - 1) % self.len;
        }
        self.index
    }

    pub fn current<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.index % items.len())
    }
}

pub fn shared_rotation() -> SharedRotation {
    Arc::new(RwLock::new(Rotation::default()))
}

pub fn read_rotation(rotation: &SharedRotation, name: &str) -> Rotation {
    *rotation.read().unwrap_or_else(|poisoned| {
        log::error!("RwLock for {} rotation was poisoned! Recovering lock.", name);
        poisoned.into_inner()
    })
}

pub fn update_rotation<R>(rotation: &SharedRotation, name: &str, f: impl FnOnce(&mut Rotation) -> R) -> R {
    let mut guard = rotation.write().unwrap_or_else(|poisoned| {
        log::error!("RwLock for {} rotation was poisoned! Recovering lock.", name);
        poisoned.into_inner()
    });
    f(&mut guard)
}

/// Advances `rotation` every `period` for as long as the server runs. Each
/// rotation gets its own timer; they are not synchronised with each other.
pub fn spawn_rotation_timer(rotation: SharedRotation, name: &'static str, period: Duration) {
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(period);
        // The first tick fires immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let index = update_rotation(&rotation, name, |r| r.advance());
            log::trace!("{} rotation advanced to {}", name, index);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_in_both_directions() {
        let mut r = Rotation::new(3);
        assert_eq!(r.advance(), 1);
        assert_eq!(r.advance(), 2);
        assert_eq!(r.advance(), 0);
        assert_eq!(r.retreat(), 2);
    }

    #[test]
    fn full_cycle_returns_to_start() {
        let mut r = Rotation::new(5);
        r.advance();
        let start = r.index();
        for _ in 0..5 {
            r.advance();
        }
        assert_eq!(r.index(), start);
    }

    #[test]
    fn empty_rotation_stays_at_zero() {
        let mut r = Rotation::new(0);
        assert_eq!(r.advance(), 0);
        assert_eq!(r.retreat(), 0);
        assert_eq!(r.current::<u8>(&[]), None);
    }

    #[test]
    fn shrinking_list_keeps_index_valid() {
        let mut r = Rotation::new(10);
        for _ in 0..7 {
            r.advance();
        }
        r.sync_len(4);
        assert_eq!(r.index(), 3);
        assert_eq!(r.current(&["a", "b", "c", "d"]), Some(&"d"));
        r.sync_len(0);
        assert_eq!(r.index(), 0);
    }

    #[test]
    fn offsets_wrap_without_touching_the_base() {
        let mut base = Rotation::new(4);
        base.advance();
        assert_eq!(base.offset_by(2).index(), 3);
        assert_eq!(base.offset_by(-2).index(), 3);
        assert_eq!(base.offset_by(-9).index(), 0);
        assert_eq!(base.index(), 1);
        assert_eq!(Rotation::new(0).offset_by(5).index(), 0);
    }

    #[test]
    fn shared_updates_are_visible() {
        let shared = shared_rotation();
        update_rotation(&shared, "test", |r| {
            r.sync_len(2);
            r.advance();
        });
        assert_eq!(read_rotation(&shared, "test").index(), 1);
    }
}
