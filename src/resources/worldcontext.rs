//! Execution context resolution.
//!
//! Before an action starts it asks the host which world it is running in. The
//! answer is an [`ExecutionContext`], or nothing when no world can be resolved
//! (for example while the owning entity graph is being torn down).
//!
//! - [`WorldKind`] – the flavour of world (game, editor, preview, ...)
//! - [`ContextResolver`] – trait the host implements to answer the question
//! - [`WorldContext`] – ECS resource describing the running world
//! - [`EcsContextResolver`] – resolver that validates entity liveness
//! - [`FixedContext`] – resolver returning a constant answer

use std::fmt;
use std::str::FromStr;

use bevy_ecs::prelude::{Entity, Resource};

/// The kind of world an action runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorldKind {
    /// A shipped game world.
    #[default]
    Game,
    /// A game world running inside the editor.
    PlayInEditor,
    /// The level editor itself, with no game running.
    Editor,
    /// An editor preview viewport (asset editors, thumbnails).
    EditorPreview,
    /// A game preview viewport.
    GamePreview,
}

impl WorldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorldKind::Game => "game",
            WorldKind::PlayInEditor => "play_in_editor",
            WorldKind::Editor => "editor",
            WorldKind::EditorPreview => "editor_preview",
            WorldKind::GamePreview => "game_preview",
        }
    }
}

impl fmt::Display for WorldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for WorldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "game" => Ok(WorldKind::Game),
            "play_in_editor" | "pie" => Ok(WorldKind::PlayInEditor),
            "editor" => Ok(WorldKind::Editor),
            "editor_preview" => Ok(WorldKind::EditorPreview),
            "game_preview" => Ok(WorldKind::GamePreview),
            other => Err(format!("Unknown world kind '{}'", other)),
        }
    }
}

/// Resolved environment an action runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionContext {
    pub kind: WorldKind,
}

impl ExecutionContext {
    pub fn new(kind: WorldKind) -> Self {
        Self { kind }
    }

    /// True for editor and game preview viewports.
    pub fn is_preview(&self) -> bool {
        matches!(self.kind, WorldKind::EditorPreview | WorldKind::GamePreview)
    }

    /// True for the level editor world with no game running.
    pub fn is_level_editor(&self) -> bool {
        self.kind == WorldKind::Editor
    }
}

/// The objects an action can borrow a world from, in lookup order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextQuery {
    /// Entity holding the action.
    pub owner: Option<Entity>,
    pub acting_actor: Option<Entity>,
    pub instigator: Option<Entity>,
}

impl ContextQuery {
    /// Candidates in lookup order: owner, acting actor, instigator.
    pub fn candidates(&self) -> impl Iterator<Item = Entity> {
        [self.owner, self.acting_actor, self.instigator]
            .into_iter()
            .flatten()
    }
}

/// Resolves the execution context for an action about to start.
pub trait ContextResolver {
    /// Returns `None` when no valid world is available.
    fn resolve(&self, query: &ContextQuery) -> Option<ExecutionContext>;
}

/// Resolver that ignores the query and always answers the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedContext(pub Option<ExecutionContext>);

impl FixedContext {
    pub fn of(kind: WorldKind) -> Self {
        Self(Some(ExecutionContext::new(kind)))
    }

    pub fn unavailable() -> Self {
        Self(None)
    }
}

impl ContextResolver for FixedContext {
    fn resolve(&self, _query: &ContextQuery) -> Option<ExecutionContext> {
        self.0
    }
}

/// Description of the running world, stored as an ECS resource.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct WorldContext {
    pub kind: WorldKind,
    /// Set while the world is shutting down; no action may start then.
    pub tearing_down: bool,
}

impl WorldContext {
    pub fn new(kind: WorldKind) -> Self {
        Self {
            kind,
            tearing_down: false,
        }
    }
}

/// Resolver for actions living in the ECS world.
///
/// The world is only reachable through a live entity: the owner first, then
/// the acting actor, then the instigator. If none of them is alive, or the
/// world is tearing down, the context is unavailable.
pub struct EcsContextResolver<'a> {
    pub world: &'a WorldContext,
    pub is_alive: &'a dyn Fn(Entity) -> bool,
}

impl ContextResolver for EcsContextResolver<'_> {
    fn resolve(&self, query: &ContextQuery) -> Option<ExecutionContext> {
        if self.world.tearing_down {
            return None;
        }
        query
            .candidates()
            .find(|entity| (self.is_alive)(*entity))
            .map(|_| ExecutionContext::new(self.world.kind))
    }
}
