//! The bridge controller.
//!
//! One [`Bridge`] exists per embedded document. It owns every piece of
//! mutable bridge state (the identifier sequence, the overlay, the
//! inspector state and mutation coalescing) and exposes one method per
//! trigger: lifecycle events, timer ticks, pointer and keyboard input and
//! inbound commands. Platform adapters only translate their native events
//! into these calls.
//!
//! ```text
//!  mutation / resize / timers ──▸ Bridge ──▸ tree, height, handshake ──▸ Channel
//!  host commands ──▸ Bridge::handle_command ──▸ inspector, overlay, inline styles
//!                                                  │
//!                                   (mutation observer) ──▸ back to the top
//! ```

use std::rc::Rc;

use serde_json::Value;

use crate::{
    BridgeConfig, Channel, Clock, Command, Dom, Event,
    identity::IdentityTagger,
    inspector::{Inspector, PointerButton, PointerOutcome},
    overlay::{Overlay, OverlayState},
    protocol::{Handshake, decode_command},
    scheduler::{MutationAction, Scheduler},
    snapshot::ElementSnapshot,
    telemetry::ErrorCapture,
    tree::{SerializedNode, TreeSerializer},
};

/// The controller for one embedded document.
pub struct Bridge<D: Dom> {
    dom: D,
    channel: Channel,
    clock: Rc<dyn Clock>,
    config: BridgeConfig,
    identity: IdentityTagger,
    overlay: Overlay<D::Node>,
    inspector: Inspector,
    scheduler: Scheduler,
}

impl<D: Dom> Bridge<D> {
    /// Set up a bridge over `dom`, emitting through `channel`. The overlay
    /// element is created immediately; nothing is sent until the first
    /// trigger.
    pub fn new(dom: D, channel: Channel, clock: Rc<dyn Clock>, config: BridgeConfig) -> Self {
        let mut overlay = Overlay::new(config.overlay_id.clone());
        overlay.create(&dom);

        Self {
            identity: IdentityTagger::new(config.id_attribute.clone()),
            scheduler: Scheduler::new(&config),
            inspector: Inspector::default(),
            dom,
            channel,
            clock,
            config,
            overlay,
        }
    }

    /// The document the bridge operates on.
    pub fn dom(&self) -> &D {
        &self.dom
    }

    /// The outbound channel.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// The clock used for telemetry timestamps.
    pub fn clock(&self) -> Rc<dyn Clock> {
        self.clock.clone()
    }

    /// The active configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The announcement schedule.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Where the overlay currently is.
    pub fn overlay_state(&self) -> OverlayState {
        self.overlay.state()
    }

    /// Whether the inspector is on.
    pub fn is_inspector_enabled(&self) -> bool {
        self.inspector.is_enabled()
    }

    /// An [`ErrorCapture`] reporting through this bridge's channel.
    pub fn error_capture(&self) -> ErrorCapture {
        ErrorCapture::new(self.channel.clone(), self.clock.clone())
    }

    /// The element's identifier, assigning one if needed.
    pub fn ensure_id(&mut self, node: &D::Node) -> String {
        self.identity.ensure_id(&self.dom, node)
    }

    /// Snapshot the document body.
    pub fn serialize_tree(&mut self) -> Option<SerializedNode> {
        TreeSerializer::new(&self.dom, &mut self.identity, &self.config.overlay_id)
            .serialize_body()
    }

    /// The document height: the largest of its measured sources.
    pub fn measure_height(&self) -> f64 {
        self.dom.height_sources().height()
    }

    /// Announce the bridge.
    pub fn send_handshake(&self) {
        self.channel.send(Event::BridgeReady(Handshake {
            version: self.config.version.clone(),
            features: self.config.features.clone(),
        }));
    }

    /// Announce the document height.
    pub fn send_height(&self) {
        self.channel.send(Event::Resize {
            height: self.measure_height(),
        });
    }

    /// Send a fresh tree snapshot.
    pub fn send_tree(&mut self) {
        let tree = self.serialize_tree();
        self.channel.send(Event::DomTreeUpdate(tree));
    }

    /// The document finished loading: make sure the host has a complete
    /// initial picture.
    pub fn on_load(&mut self) {
        tracing::debug!("Document loaded, announcing bridge");
        self.overlay.create(&self.dom);
        self.send_handshake();
        self.send_height();
        self.send_tree();
    }

    /// The body changed size.
    pub fn on_resize(&self) {
        self.send_height();
    }

    /// Something under the body mutated.
    pub fn on_mutation(&mut self) -> MutationAction {
        let action = self.scheduler.on_mutation();
        if action == MutationAction::PushNow {
            self.push_mutation();
        }
        action
    }

    /// A scheduled mutation flush fired.
    pub fn flush_mutations(&mut self) {
        if self.scheduler.take_flush() {
            self.push_mutation();
        }
    }

    fn push_mutation(&mut self) {
        self.send_tree();
        self.send_height();
    }

    /// The handshake period elapsed.
    pub fn on_handshake_tick(&self) {
        self.send_handshake();
    }

    /// The height period elapsed.
    pub fn on_height_tick(&self) {
        self.send_height();
    }

    /// Turn the inspector on or off.
    pub fn set_inspector(&mut self, enabled: bool) {
        self.overlay.create(&self.dom);
        if enabled {
            self.inspector.enable(&self.dom);
        } else {
            self.inspector.disable(&self.dom, &mut self.overlay);
        }
        tracing::info!(enabled, "Inspector toggled");
    }

    /// The pointer moved onto `target`.
    pub fn on_pointer_move(&mut self, target: &D::Node) -> PointerOutcome {
        if !self.inspector.is_enabled() {
            return PointerOutcome::PASS;
        }
        if self.inspector.is_target(&self.dom, &self.overlay, target) {
            self.overlay.position(&self.dom, Some(target));
        }
        PointerOutcome::STOP
    }

    /// `target` was clicked.
    pub fn on_click(&mut self, target: &D::Node, button: PointerButton) -> PointerOutcome {
        if !self.inspector.is_enabled()
            || button != PointerButton::Primary
            || !self.inspector.is_target(&self.dom, &self.overlay, target)
        {
            return PointerOutcome::PASS;
        }

        let id = self.ensure_id(target);
        let snapshot = ElementSnapshot::capture(&self.dom, target, id, true);
        self.overlay.position(&self.dom, Some(target));

        if !self.dom.is_embedded() {
            self.dom.write_console(&format!(
                "[Ardor Peek] <{}> {}:{}",
                snapshot.tag_name,
                snapshot.source.file_name,
                snapshot.source.line_number.as_deref().unwrap_or("0"),
            ));
        }
        self.channel.send(Event::ElementSelected(snapshot));

        PointerOutcome::SWALLOW
    }

    /// A key was pressed somewhere in the document.
    pub fn on_key_down(&mut self, key: &str) {
        if key == "Escape" && self.inspector.is_enabled() {
            self.set_inspector(false);
        }
    }

    /// Decode and run an inbound message. Returns whether it was a command.
    pub fn handle_message(&mut self, message: &Value) -> bool {
        match decode_command(message) {
            Some(command) => {
                self.handle_command(command);
                true
            }
            None => false,
        }
    }

    /// Run a command from the host frame.
    pub fn handle_command(&mut self, command: Command) {
        tracing::debug!(?command, "Handling host command");
        match command {
            Command::ToggleInspector { enabled } => self.set_inspector(enabled),
            Command::HighlightNode { id } => self.highlight(&id),
            Command::UpdateStyle {
                id,
                property,
                value,
            } => self.update_style(&id, &property, &value),
            Command::Ping => self.send_handshake(),
        }
    }

    fn highlight(&mut self, id: &str) {
        let Some(target) = self.identity.find(&self.dom, id) else {
            return;
        };

        self.overlay.position(&self.dom, Some(&target));
        self.dom.scroll_into_view(&target);

        let id = self.ensure_id(&target);
        let snapshot = ElementSnapshot::capture(&self.dom, &target, id, false);
        self.channel.send(Event::ElementSelected(snapshot));
    }

    fn update_style(&mut self, id: &str, property: &str, value: &str) {
        let Some(target) = self.identity.find(&self.dom, id) else {
            return;
        };

        self.dom.set_inline_style(&target, property, value);
        self.overlay.position(&self.dom, Some(&target));
    }

    /// Tear down everything the bridge added to the document.
    pub fn destroy(&mut self) {
        if self.inspector.is_enabled() {
            self.inspector.disable(&self.dom, &mut self.overlay);
        }
        self.overlay.destroy(&self.dom);
        tracing::debug!("Bridge destroyed");
    }
}
