//! Chapter selection and prev/next traversal

use crate::catalog::Catalog;
use crate::rules::Heuristics;
use crate::title::default_heuristics;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Traversal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Position delta: +1 or -1
    pub fn delta(self) -> isize {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

impl TryFrom<i32> for Direction {
    type Error = i32;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Direction::Forward),
            -1 => Ok(Direction::Backward),
            other => Err(other),
        }
    }
}

/// Choose the chapter to open first, with the built-in heuristics
pub fn select_initial(
    catalog: &Catalog,
    default_key: Option<&str>,
    pending_key: Option<&str>,
) -> Option<String> {
    select_initial_with(catalog, default_key, pending_key, default_heuristics())
}

/// Choose the chapter to open first.
///
/// Priority: the pending resume key, the TOC's default chapter, the first
/// entry titled like content, the first navigable entry, the first entry.
/// Keys are returned in the catalog's own form.
pub fn select_initial_with(
    catalog: &Catalog,
    default_key: Option<&str>,
    pending_key: Option<&str>,
    heuristics: &Heuristics,
) -> Option<String> {
    let resolve = |key: Option<&str>| key.and_then(|k| catalog.index_of(k));
    let with_key = |position: &usize| catalog.key_at(*position).is_some();
    let positions = || (0..catalog.len()).filter(with_key);

    let (position, reason) = if let Some(p) = resolve(pending_key).filter(with_key) {
        (p, "pending")
    } else if let Some(p) = resolve(default_key).filter(with_key) {
        (p, "toc default")
    } else if let Some(p) = positions().find(|p| {
        catalog
            .get(*p)
            .and_then(|e| e.title())
            .map(|t| heuristics.is_likely_content_title(t))
            .unwrap_or(false)
    }) {
        (p, "content title")
    } else if let Some(p) = positions().find(|p| catalog.is_navigable_at(*p)) {
        (p, "first navigable")
    } else {
        (positions().next()?, "first entry")
    };

    let key = catalog.key_at(position)?.to_string();
    debug!(key = %key, position, reason, "selected initial chapter");
    Some(key)
}

/// Next navigable chapter from `from_key` in `direction`.
///
/// An unknown `from_key` starts just outside the catalog, so stepping
/// forward from it lands on the first navigable entry and stepping back on
/// the last. Returns `None` once nothing navigable remains.
pub fn step(catalog: &Catalog, from_key: Option<&str>, direction: Direction) -> Option<String> {
    let len = catalog.len() as isize;
    let start = match from_key.and_then(|k| catalog.index_of(k)) {
        Some(position) => position as isize,
        None => match direction {
            Direction::Forward => -1,
            Direction::Backward => len,
        },
    };

    let mut position = start + direction.delta();
    while (0..len).contains(&position) {
        let p = position as usize;
        if catalog.is_navigable_at(p) {
            if let Some(key) = catalog.key_at(p) {
                return Some(key.to_string());
            }
        }
        position += direction.delta();
    }
    None
}

/// Externally visible cursor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorState {
    /// No current chapter
    Unresolved,

    /// A current chapter is set and valid against the last catalog
    Positioned,
}

/// Current chapter plus a resume request not yet matched to a catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    current: Option<String>,
    pending: Option<String>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CursorState {
        if self.current.is_some() {
            CursorState::Positioned
        } else {
            CursorState::Unresolved
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Record a resume request to consult at the next selection
    pub fn set_pending(&mut self, key: impl Into<String>) {
        self.pending = Some(key.into());
    }

    /// Forget the current chapter after a catalog rebuild. The pending
    /// request survives and is retried.
    pub fn reset(&mut self) {
        self.current = None;
    }

    /// Position on the initial chapter of a freshly built catalog.
    ///
    /// A pending request is cleared once it resolves; one that does not
    /// resolve stays pending for the next catalog.
    pub fn select_initial(
        &mut self,
        catalog: &Catalog,
        default_key: Option<&str>,
        heuristics: &Heuristics,
    ) -> Option<&str> {
        let chosen =
            select_initial_with(catalog, default_key, self.pending.as_deref(), heuristics);
        if self
            .pending
            .as_deref()
            .is_some_and(|pending| catalog.contains(pending))
        {
            self.pending = None;
        }
        self.current = chosen;
        self.current.as_deref()
    }

    /// Move to a key if the catalog knows it. Leaves the cursor unchanged
    /// and returns `None` otherwise.
    pub fn move_to(&mut self, catalog: &Catalog, key: &str) -> Option<&str> {
        let canonical = catalog
            .index_of(key)
            .and_then(|position| catalog.key_at(position))?
            .to_string();
        self.current = Some(canonical);
        self.current.as_deref()
    }

    /// Neighbour in `direction`; `None` when unresolved or at the end
    pub fn peek(&self, catalog: &Catalog, direction: Direction) -> Option<String> {
        let current = self.current.as_deref()?;
        step(catalog, Some(current), direction)
    }

    /// Whether the control for `direction` should be enabled
    pub fn can_step(&self, catalog: &Catalog, direction: Direction) -> bool {
        self.peek(catalog, direction).is_some()
    }
}
