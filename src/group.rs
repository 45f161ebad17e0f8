use crate::actor::Actor;

/// Soft alive/dead lifecycle shared by everything an [`ActorGroup`] pools.
pub trait Liveness {
    fn is_dead(&self) -> bool;

    fn make_actor_appeared(&mut self);

    fn make_actor_dead(&mut self);
}

impl<N: Copy + PartialEq> Liveness for Actor<N> {
    fn is_dead(&self) -> bool {
        Actor::is_dead(self)
    }

    fn make_actor_appeared(&mut self) {
        Actor::make_actor_appeared(self)
    }

    fn make_actor_dead(&mut self) {
        Actor::make_actor_dead(self)
    }
}

/// Ordered pool of actors of one kind. Dead slots are recycled rather than
/// freed.
#[derive(Debug)]
pub struct ActorGroup<T> {
    pub name: String,
    actors: Vec<T>,
}

impl<T: Liveness> ActorGroup<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actors: Vec::new(),
        }
    }

    pub fn register_actor(&mut self, actor: T) {
        self.actors.push(actor);
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn get_actor(&self, index: usize) -> Option<&T> {
        self.actors.get(index)
    }

    pub fn get_actor_mut(&mut self, index: usize) -> Option<&mut T> {
        self.actors.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.actors.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.actors.iter_mut()
    }

    pub fn appear_all(&mut self) {
        for actor in self.actors.iter_mut().filter(|actor| actor.is_dead()) {
            actor.make_actor_appeared();
        }
    }

    pub fn kill_all(&mut self) {
        for actor in &mut self.actors {
            actor.make_actor_dead();
        }
    }

    pub fn living_actor_num(&self) -> usize {
        self.actors.iter().filter(|actor| !actor.is_dead()).count()
    }

    /// First dead actor in registration order, for reuse.
    pub fn get_dead_actor(&mut self) -> Option<&mut T> {
        self.actors.iter_mut().find(|actor| actor.is_dead())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::ZoneAndLayer;

    fn group_of_three() -> ActorGroup<Actor> {
        let mut group = ActorGroup::new("Coins");
        for name in ["Coin0", "Coin1", "Coin2"] {
            group.register_actor(Actor::new(name, ZoneAndLayer::DYNAMIC_SPAWN));
        }
        group
    }

    #[test]
    fn dead_slot_lookup_follows_insertion_order() {
        let mut group = group_of_three();
        assert!(group.get_dead_actor().is_none());
        assert_eq!(group.living_actor_num(), 3);

        group.get_actor_mut(1).unwrap().make_actor_dead();
        assert_eq!(group.get_dead_actor().unwrap().name, "Coin1");

        group.get_actor_mut(0).unwrap().make_actor_dead();
        assert_eq!(group.get_dead_actor().unwrap().name, "Coin0");
        assert_eq!(group.living_actor_num(), 1);
    }

    #[test]
    fn recycled_slot_is_no_longer_dead() {
        let mut group = group_of_three();
        group.get_actor_mut(2).unwrap().make_actor_dead();
        group.get_dead_actor().unwrap().make_actor_appeared();
        assert!(group.get_dead_actor().is_none());
    }

    #[test]
    fn kill_all_and_appear_all() {
        let mut group = group_of_three();
        group.kill_all();
        assert_eq!(group.living_actor_num(), 0);
        assert_eq!(group.get_dead_actor().unwrap().name, "Coin0");

        group.appear_all();
        assert_eq!(group.living_actor_num(), 3);
        assert!(group.iter().all(|actor| !actor.is_dead()));
    }
}
