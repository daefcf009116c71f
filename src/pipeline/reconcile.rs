//! Reconcile - One unit of work and the positional child diff.
//!
//! A unit of work is one fiber. Host fibers make sure their node exists;
//! component fibers call their render function with a fresh hook cursor.
//! Either way the fiber's new children are then diffed against the
//! children of its alternate.
//!
//! # Child diff
//!
//! One forward scan over the new elements (by index) and the old fibers (by
//! sibling link), until both run out:
//!
//! | old fiber      | new element    | result                       |
//! |----------------|----------------|------------------------------|
//! | same type      | same type      | UPDATE, host node reused     |
//! | other / none   | present        | PLACE, no host node yet      |
//! | present        | other / none   | old fiber into deletion set  |
//!
//! Positions match by index only. Reordering keyless siblings re-types them.
//!
//! A rebuild pass skips the table for the root's children: every old child
//! is deleted and every new one placed.

use std::rc::Rc;

use log::trace;

use crate::engine::{Engine, Fiber, FiberId};
use crate::error::{Error, Result};
use crate::primitives::{Element, ElementType, Props};
use crate::renderer::{HostAdapter, apply_props};
use crate::state::{Hooks, Instance, PreviousHooks};
use crate::types::PendingOp;

impl<H: HostAdapter> Engine<H> {
    /// Process `id` and return the next fiber to work on, staying inside the
    /// subtree of the pass `root`.
    pub(crate) fn perform_unit_of_work(
        &mut self,
        id: FiberId,
        root: FiberId,
    ) -> Result<Option<FiberId>> {
        trace!("unit of work {id:?} <{}>", self.fibers[id].kind.label());
        if self.fibers[id].is_component() {
            self.update_component(id)?;
        } else {
            self.update_host(id)?;
        }
        Ok(self.fibers.next_in_subtree(id, root))
    }

    fn update_host(&mut self, id: FiberId) -> Result<()> {
        let fiber = &self.fibers[id];
        let kind = fiber.kind.clone();
        let props = Rc::clone(&fiber.props);

        // First appearance only. Reused fibers already carry their node.
        if fiber.host.is_none() {
            let node = match &kind {
                ElementType::Text => self.host.create_text_node(&props.node_value())?,
                ElementType::Host(tag) => self.host.create_node(tag)?,
                ElementType::Component(_) => return Ok(()),
            };
            let fiber = &mut self.fibers[id];
            fiber.host = Some(node.clone());
            fiber.fresh_host = true;
            if kind != ElementType::Text {
                apply_props(&mut self.host, &node, &Props::new(), &props)?;
            }
        }

        self.reconcile_children(id, props.children().to_vec());
        Ok(())
    }

    fn update_component(&mut self, id: FiberId) -> Result<()> {
        let fiber = &self.fibers[id];
        let ElementType::Component(component) = &fiber.kind else {
            return Ok(());
        };
        let component = component.clone();
        let props = Rc::clone(&fiber.props);

        let previous_state = fiber
            .alternate
            .and_then(|alt| self.fibers.get(alt))
            .and_then(|alt| alt.hooks.as_ref());
        let previous = previous_state.map(PreviousHooks::capture);
        let instance = match previous_state {
            Some(state) => Rc::clone(&state.instance),
            None => Rc::new(Instance::new(component.name_rc())),
        };

        let mut hooks = Hooks::new(
            instance,
            Rc::downgrade(&self.inbox),
            previous,
            self.config.flags,
        );
        let rendered = component.call(&props, &mut hooks)?;
        let state = hooks.finish()?;
        if rendered.len() != 1 {
            return Err(Error::MalformedTree {
                component: component.name().to_string(),
                count: rendered.len(),
            });
        }

        self.fibers[id].hooks = Some(state);
        self.reconcile_children(id, rendered);
        Ok(())
    }

    /// Diff `elements` against the old children of `parent`'s alternate and
    /// link the resulting fibers under `parent`.
    pub(crate) fn reconcile_children(&mut self, parent: FiberId, elements: Vec<Element>) {
        let mut old = self.fibers[parent]
            .alternate
            .and_then(|alt| self.fibers.get(alt))
            .and_then(|alt| alt.child);
        let rebuild = self
            .pass
            .as_ref()
            .is_some_and(|pass| pass.rebuild && pass.root == parent);
        let mut previous: Option<FiberId> = None;
        let mut elements = elements.into_iter();

        loop {
            let element = elements.next();
            if element.is_none() && old.is_none() {
                break;
            }
            let old_fiber = old.and_then(|id| self.fibers.get(id));
            let next_old = old_fiber.and_then(|fiber| fiber.sibling);
            let same_type = match (&element, old_fiber) {
                (Some(element), Some(fiber)) => !rebuild && *element.kind() == fiber.kind,
                _ => false,
            };

            let created = match (element, old) {
                (Some(element), Some(old_id)) if same_type => {
                    let reused =
                        Fiber::reuse(&self.fibers[old_id], old_id, element.shared_props(), parent);
                    Some(self.allocate(reused))
                }
                (element, old_id) => {
                    if let Some(old_id) = old_id {
                        self.mark_deletion(old_id);
                    }
                    element.map(|element| {
                        let placed = Fiber::placement(
                            element.kind().clone(),
                            element.shared_props(),
                            parent,
                        );
                        self.allocate(placed)
                    })
                }
            };

            if let Some(id) = created {
                match previous {
                    Some(prev) => self.fibers[prev].sibling = Some(id),
                    None => self.fibers[parent].child = Some(id),
                }
                previous = Some(id);
            }
            old = next_old;
        }
    }

    fn mark_deletion(&mut self, id: FiberId) {
        if let Some(fiber) = self.fibers.get_mut(id) {
            trace!("delete {id:?} <{}>", fiber.kind.label());
            fiber.op = PendingOp::Delete;
            self.deletions.push(id);
        }
    }
}
