//! The boundary to whatever owns the placed instances.
//!
//! The placer never holds instances itself. It asks a [`BeingHost`] to
//! spawn, move, show/hide, attach and destroy them through opaque handles,
//! and treats a handle that no longer resolves as an absent instance.

use glam::{Quat, Vec3};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::{ArchetypeId, BeingArchetype};

/// Opaque handle to a host-owned instance. May go stale at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceHandle(pub u64);

/// Opaque token for the object placed beings get attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentHandle(pub u64);

/// Services the placer needs from the world it places into.
pub trait BeingHost {
    /// Create an instance of `archetype` at the origin. `None` if the host
    /// cannot spawn it.
    fn spawn(&mut self, archetype: &BeingArchetype) -> Option<InstanceHandle>;

    fn destroy(&mut self, handle: InstanceHandle);

    fn is_alive(&self, handle: InstanceHandle) -> bool;

    fn set_transform(&mut self, handle: InstanceHandle, location: Vec3, rotation: Quat);

    /// Toggle visibility, collision and ticking together. Pending instances
    /// are inactive, placed ones active.
    fn set_active(&mut self, handle: InstanceHandle, active: bool);

    fn attach(&mut self, handle: InstanceHandle, parent: ParentHandle);

    /// Detach keeping the world transform.
    fn detach(&mut self, handle: InstanceHandle);

    fn archetype_of(&self, handle: InstanceHandle) -> Option<ArchetypeId>;

    /// World location and rotation of a live instance.
    fn transform_of(&self, handle: InstanceHandle) -> Option<(Vec3, Quat)>;

    /// Live instances currently attached to `parent`.
    fn children_of(&self, parent: ParentHandle) -> Vec<InstanceHandle>;
}

/// State of one instance in a [`HeadlessHost`].
#[derive(Clone, Debug, PartialEq)]
pub struct HostInstance {
    pub archetype: ArchetypeId,
    pub location: Vec3,
    pub rotation: Quat,
    pub active: bool,
    pub parent: Option<ParentHandle>,
}

/// In-memory host for tools and tests. Instances are plain records.
#[derive(Debug, Default)]
pub struct HeadlessHost {
    instances: HashMap<InstanceHandle, HostInstance>,
    next_handle: u64,
    spawned_total: u64,
    destroyed_total: u64,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instance(&self, handle: InstanceHandle) -> Option<&HostInstance> {
        self.instances.get(&handle)
    }

    /// Number of live instances, active or not.
    pub fn live_count(&self) -> usize {
        self.instances.len()
    }

    pub fn active_count(&self) -> usize {
        self.instances.values().filter(|i| i.active).count()
    }

    pub fn spawned_total(&self) -> u64 {
        self.spawned_total
    }

    pub fn destroyed_total(&self) -> u64 {
        self.destroyed_total
    }

    /// Remove an instance without going through the placer, as an editor
    /// user deleting it by hand would.
    pub fn forget(&mut self, handle: InstanceHandle) -> Option<HostInstance> {
        self.instances.remove(&handle)
    }
}

impl BeingHost for HeadlessHost {
    fn spawn(&mut self, archetype: &BeingArchetype) -> Option<InstanceHandle> {
        self.next_handle += 1;
        let handle = InstanceHandle(self.next_handle);
        self.instances.insert(
            handle,
            HostInstance {
                archetype: archetype.id.clone(),
                location: Vec3::ZERO,
                rotation: Quat::IDENTITY,
                active: true,
                parent: None,
            },
        );
        self.spawned_total += 1;
        Some(handle)
    }

    fn destroy(&mut self, handle: InstanceHandle) {
        if self.instances.remove(&handle).is_some() {
            self.destroyed_total += 1;
        }
    }

    fn is_alive(&self, handle: InstanceHandle) -> bool {
        self.instances.contains_key(&handle)
    }

    fn set_transform(&mut self, handle: InstanceHandle, location: Vec3, rotation: Quat) {
        if let Some(instance) = self.instances.get_mut(&handle) {
            instance.location = location;
            instance.rotation = rotation;
        }
    }

    fn set_active(&mut self, handle: InstanceHandle, active: bool) {
        if let Some(instance) = self.instances.get_mut(&handle) {
            instance.active = active;
        }
    }

    fn attach(&mut self, handle: InstanceHandle, parent: ParentHandle) {
        if let Some(instance) = self.instances.get_mut(&handle) {
            instance.parent = Some(parent);
        }
    }

    fn detach(&mut self, handle: InstanceHandle) {
        if let Some(instance) = self.instances.get_mut(&handle) {
            instance.parent = None;
        }
    }

    fn archetype_of(&self, handle: InstanceHandle) -> Option<ArchetypeId> {
        self.instances.get(&handle).map(|i| i.archetype.clone())
    }

    fn transform_of(&self, handle: InstanceHandle) -> Option<(Vec3, Quat)> {
        self.instances.get(&handle).map(|i| (i.location, i.rotation))
    }

    fn children_of(&self, parent: ParentHandle) -> Vec<InstanceHandle> {
        let mut children: Vec<InstanceHandle> = self
            .instances
            .iter()
            .filter(|(_, i)| i.parent == Some(parent))
            .map(|(h, _)| *h)
            .collect();
        // HashMap order is arbitrary.
        children.sort_unstable();
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_and_destroy() {
        let mut host = HeadlessHost::new();
        let a = host.spawn(&BeingArchetype::named("coral")).unwrap();
        let b = host.spawn(&BeingArchetype::named("fan")).unwrap();
        assert_ne!(a, b);
        assert_eq!(host.live_count(), 2);
        assert_eq!(host.archetype_of(b), Some(ArchetypeId::new("fan")));

        host.destroy(a);
        host.destroy(a);
        assert!(!host.is_alive(a));
        assert_eq!(host.destroyed_total(), 1);
        assert_eq!(host.archetype_of(a), None);
    }

    #[test]
    fn test_children_follow_attachment() {
        let mut host = HeadlessHost::new();
        let parent = ParentHandle(9);
        let a = host.spawn(&BeingArchetype::default()).unwrap();
        let b = host.spawn(&BeingArchetype::default()).unwrap();
        host.attach(b, parent);
        host.attach(a, parent);
        assert_eq!(host.children_of(parent), vec![a, b]);

        host.detach(a);
        assert_eq!(host.children_of(parent), vec![b]);
    }

    #[test]
    fn test_stale_handles_are_ignored() {
        let mut host = HeadlessHost::new();
        let stale = InstanceHandle(1234);
        host.set_transform(stale, Vec3::ONE, Quat::IDENTITY);
        host.set_active(stale, false);
        host.attach(stale, ParentHandle(1));
        assert_eq!(host.live_count(), 0);
        assert_eq!(host.transform_of(stale), None);
    }

    #[test]
    fn test_transform_and_activity() {
        let mut host = HeadlessHost::new();
        let h = host.spawn(&BeingArchetype::default()).unwrap();
        host.set_transform(h, Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_z(1.0));
        host.set_active(h, false);
        let instance = host.instance(h).unwrap();
        assert_eq!(instance.location, Vec3::new(1.0, 2.0, 3.0));
        assert!(!instance.active);
        assert_eq!(host.active_count(), 0);
    }
}
