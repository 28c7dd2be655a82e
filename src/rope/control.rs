//! Rope control surface.
//!
//! UI code never touches a [`Rope`] directly: it writes [`RopeCommand`]
//! messages and [`apply_rope_commands_system`] applies them.  Intent toggles
//! take effect immediately; `ResetLength` clears the intents immediately and
//! defers the chain rebuild to the next fixed tick so the chain and pool are
//! only ever mutated from `FixedUpdate`.
//!
//! Commands are broadcast to every enabled rope.  A rope entity that has not
//! been initialised yet keeps its commands in [`QueuedRopeCommands`];
//! `init_ropes_system` replays them once the [`Rope`] exists.

use super::chain::Rope;
use super::physics::{RopeAttachments, RopeDisabled};
use bevy::prelude::*;

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RopeCommand {
    BeginExtend,
    EndExtend,
    BeginRetract,
    EndRetract,
    /// Shrink back to a single segment and clear both intents.
    ResetLength,
    /// Hang a new moving body from the rope.
    AttachBody(Entity),
    /// Let go of the moving body.
    DetachBody,
}

/// Commands that arrived before the rope entity got its [`Rope`].
#[derive(Component, Debug, Clone, Default)]
pub struct QueuedRopeCommands(pub(crate) Vec<RopeCommand>);

impl QueuedRopeCommands {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Apply the rope-side effect of one command.  The moving body entity itself
/// lives in [`RopeAttachments`] and is updated by the caller.
pub(crate) fn apply_to_rope(rope: &mut Rope, command: RopeCommand) {
    match command {
        RopeCommand::BeginExtend => rope.begin_extend(),
        RopeCommand::EndExtend => rope.end_extend(),
        RopeCommand::BeginRetract => rope.begin_retract(),
        RopeCommand::EndRetract => rope.end_retract(),
        RopeCommand::ResetLength => {
            rope.request_reset();
            info!("[rope] Reset requested");
        }
        RopeCommand::AttachBody(body) => {
            rope.attach_body();
            info!("[rope] Body {:?} attached", body);
        }
        RopeCommand::DetachBody => {
            rope.detach_body();
            info!("[rope] Body detached");
        }
    }
}

/// Apply queued [`RopeCommand`]s to every enabled rope.
pub fn apply_rope_commands_system(
    mut messages: MessageReader<RopeCommand>,
    mut ropes: Query<
        (&mut RopeAttachments, Option<&mut Rope>, &mut QueuedRopeCommands),
        Without<RopeDisabled>,
    >,
) {
    for &command in messages.read() {
        for (mut attachments, rope, mut queued) in ropes.iter_mut() {
            match command {
                RopeCommand::AttachBody(body) => attachments.body = Some(body),
                RopeCommand::DetachBody => attachments.body = None,
                _ => {}
            }
            match rope {
                Some(mut rope) => apply_to_rope(&mut rope, command),
                None => queued.0.push(command),
            }
        }
    }
}

/// Translate arrow keys into [`RopeCommand`]s.
///
/// - **Down** held → pay out rope
/// - **Up** held → reel in rope
pub fn keyboard_rope_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut writer: MessageWriter<RopeCommand>,
) {
    if keys.just_pressed(KeyCode::ArrowDown) {
        writer.write(RopeCommand::BeginExtend);
    }
    if keys.just_released(KeyCode::ArrowDown) {
        writer.write(RopeCommand::EndExtend);
    }
    if keys.just_pressed(KeyCode::ArrowUp) {
        writer.write(RopeCommand::BeginRetract);
    }
    if keys.just_released(KeyCode::ArrowUp) {
        writer.write(RopeCommand::EndRetract);
    }
}
