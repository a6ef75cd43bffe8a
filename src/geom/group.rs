//! Composite shapes.
//!
//! A [`Group`] never nests: members are flattened into a [`PrimitiveArena`]
//! on insertion and the group keeps the member indices in order.

use super::Primitive;

/// Index of a primitive inside a [`PrimitiveArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrimitiveId(u32);

impl PrimitiveId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Flat storage of non-group primitives.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PrimitiveArena {
    items: Vec<Primitive>,
}

impl PrimitiveArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `primitive`, unpacking groups, and return the ids it occupies.
    pub fn insert(&mut self, primitive: Primitive) -> Vec<PrimitiveId> {
        match primitive {
            Primitive::Group(group) => group
                .into_members()
                .flat_map(|member| self.insert(member))
                .collect(),
            leaf => {
                let id = PrimitiveId(self.items.len() as u32);
                self.items.push(leaf);
                vec![id]
            }
        }
    }

    pub fn get(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.items.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[Primitive] {
        &self.items
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Group {
    arena: PrimitiveArena,
    members: Vec<PrimitiveId>,
}

impl Group {
    pub fn new(items: impl IntoIterator<Item = Primitive>) -> Self {
        let mut group = Group::default();
        for item in items {
            group.push(item);
        }
        group
    }

    pub fn push(&mut self, item: Primitive) {
        let ids = self.arena.insert(item);
        self.members.extend(ids);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn ids(&self) -> &[PrimitiveId] {
        &self.members
    }

    pub fn arena(&self) -> &PrimitiveArena {
        &self.arena
    }

    pub fn members(&self) -> impl Iterator<Item = &Primitive> + '_ {
        self.members.iter().filter_map(|id| self.arena.get(*id))
    }

    fn into_members(self) -> impl Iterator<Item = Primitive> {
        let Group { arena, members } = self;
        let mut slots: Vec<Option<Primitive>> = arena.items.into_iter().map(Some).collect();
        members
            .into_iter()
            .filter_map(move |id| slots.get_mut(id.index()).and_then(Option::take))
    }

    /// Member values concatenated in member order.
    pub fn atomic_values(&self) -> Vec<f64> {
        self.members().flat_map(Primitive::atomic_values).collect()
    }

    /// Build a new group by mapping every member.
    pub fn try_map<E>(&self, mut f: impl FnMut(&Primitive) -> Result<Primitive, E>) -> Result<Group, E> {
        let mut out = Group::default();
        for member in self.members() {
            out.push(f(member)?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::LineSegment;
    use glam::dvec2;

    #[test]
    fn nested_groups_flatten_in_order() {
        let inner = Group::new([
            Primitive::Point(dvec2(1.0, 1.0)),
            Primitive::Point(dvec2(2.0, 2.0)),
        ]);
        let outer = Group::new([
            Primitive::Point(dvec2(0.0, 0.0)),
            Primitive::Group(inner),
            Primitive::Line(LineSegment::new(dvec2(3.0, 3.0), dvec2(4.0, 4.0))),
        ]);
        assert_eq!(outer.len(), 4);
        assert!(outer.members().all(|m| !matches!(m, Primitive::Group(_))));
        assert_eq!(
            outer.atomic_values(),
            vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0]
        );
    }

    #[test]
    fn arena_ids_are_stable() {
        let mut arena = PrimitiveArena::new();
        let first = arena.insert(Primitive::Point(dvec2(5.0, 6.0)));
        let second = arena.insert(Primitive::Point(dvec2(7.0, 8.0)));
        assert_eq!(first.len(), 1);
        assert_eq!(arena.get(second[0]), Some(&Primitive::Point(dvec2(7.0, 8.0))));
        assert_eq!(arena.len(), 2);
    }
}
