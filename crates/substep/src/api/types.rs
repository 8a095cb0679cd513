/// Identifier of a simulated entity, stored in rapier's `user_data` so
/// collision events can be mapped back to entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);
