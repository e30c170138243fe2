use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Species tag of an agent.
///
/// Groups form a small closed set so that per-group rules can be looked up
/// in flat tables indexed by [`Group::index`] instead of going through
/// dynamic dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    Boid,
    Chaser,
}

impl Group {
    pub const COUNT: usize = 2;
    pub const ALL: [Group; Group::COUNT] = [Group::Boid, Group::Chaser];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Group::Boid => 0,
            Group::Chaser => 1,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Group::Boid => "boid",
            Group::Chaser => "chaser",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One value per [`Group`], addressable by group.
///
/// Serializes as a table keyed by group name, e.g. `[groups.boid]` and
/// `[groups.chaser]` in TOML.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupTable<T> {
    pub boid: T,
    pub chaser: T,
}

impl<T> GroupTable<T> {
    pub fn from_fn(mut f: impl FnMut(Group) -> T) -> Self {
        Self {
            boid: f(Group::Boid),
            chaser: f(Group::Chaser),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Group, &T)> {
        Group::ALL.into_iter().map(move |g| (g, &self[g]))
    }
}

impl<T> Index<Group> for GroupTable<T> {
    type Output = T;

    fn index(&self, group: Group) -> &T {
        match group {
            Group::Boid => &self.boid,
            Group::Chaser => &self.chaser,
        }
    }
}

impl<T> IndexMut<Group> for GroupTable<T> {
    fn index_mut(&mut self, group: Group) -> &mut T {
        match group {
            Group::Boid => &mut self.boid,
            Group::Chaser => &mut self.chaser,
        }
    }
}
