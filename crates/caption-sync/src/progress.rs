//! On-page progress indicator for a transcript translation pass.

use cue_host_dom::{Document, NodeId, Selector};
use tokio::time::Instant;

use crate::constants::{
    PROGRESS_FADEOUT_DELAY, PROGRESS_INDICATOR_ID, PROGRESS_REMOVAL_DELAY, PROGRESS_TEXT_ID, class,
};
use crate::{Messages, Result};

pub fn format_progress(completed: usize, total: usize) -> String {
    let percentage = if total == 0 {
        100
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u32
    };
    format!("{completed}/{total} ({percentage}%)")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Running,
    /// Completion message shown; fades at `fade_at`.
    Completed { fade_at: Instant },
    FadingOut { remove_at: Instant },
}

#[derive(Debug)]
struct Mounted {
    node: NodeId,
    phase: Phase,
}

#[derive(Debug)]
pub struct ProgressIndicator {
    messages: &'static Messages,
    mounted: Option<Mounted>,
}

impl ProgressIndicator {
    pub fn new(messages: &'static Messages) -> Self {
        Self {
            messages,
            mounted: None,
        }
    }

    pub fn set_messages(&mut self, messages: &'static Messages) {
        self.messages = messages;
    }

    pub fn is_visible(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn node(&self) -> Option<NodeId> {
        self.mounted.as_ref().map(|m| m.node)
    }

    /// Mounts the spinner at 0%. A running indicator is left alone; one that is
    /// finishing is replaced.
    pub fn show(&mut self, doc: &mut Document) -> Result<()> {
        if let Some(mounted) = &self.mounted {
            if mounted.phase == Phase::Running && doc.is_connected(mounted.node) {
                return Ok(());
            }
        }
        self.remove(doc)?;

        let indicator = doc.create_element("div");
        doc.set_attribute(indicator, "id", PROGRESS_INDICATOR_ID)?;

        let content = append_div(doc, indicator, "content-wrapper")?;
        append_div(doc, content, class::SPINNER)?;
        let text = append_div(doc, content, "text-wrapper")?;
        let status = append_div(doc, text, "status")?;
        doc.set_text_content(status, self.messages.translating)?;
        let progress = append_div(doc, text, "progress-text")?;
        doc.set_attribute(progress, "id", PROGRESS_TEXT_ID)?;
        doc.set_text_content(progress, "0%")?;

        let parent = mount_point(doc);
        doc.append_child(parent, indicator)?;

        self.mounted = Some(Mounted {
            node: indicator,
            phase: Phase::Running,
        });
        Ok(())
    }

    pub fn update(&mut self, doc: &mut Document, completed: usize, total: usize) -> Result<()> {
        let Some(Mounted {
            node,
            phase: Phase::Running,
        }) = self.mounted
        else {
            return Ok(());
        };
        let Some(text) = doc
            .descendants(node)
            .into_iter()
            .find(|n| doc.attribute(*n, "id") == Some(PROGRESS_TEXT_ID))
        else {
            return Ok(());
        };
        doc.set_text_content(text, &format_progress(completed, total))?;
        Ok(())
    }

    /// Swaps the spinner for the completion message and starts the fade timer.
    pub fn complete(&mut self, doc: &mut Document, now: Instant) -> Result<()> {
        let Some(mounted) = self.mounted.as_mut() else {
            return Ok(());
        };
        if mounted.phase != Phase::Running {
            return Ok(());
        }

        doc.clear_children(mounted.node)?;
        let wrapper = append_div(doc, mounted.node, "completion-wrapper")?;
        let icon = doc.create_element("span");
        doc.add_class(icon, "icon")?;
        doc.set_text_content(icon, "✓")?;
        doc.append_child(wrapper, icon)?;
        let text = doc.create_element("span");
        doc.add_class(text, "text")?;
        doc.set_text_content(text, self.messages.translation_complete)?;
        doc.append_child(wrapper, text)?;

        mounted.phase = Phase::Completed {
            fade_at: now + PROGRESS_FADEOUT_DELAY,
        };
        Ok(())
    }

    /// Advances the fade-out. Call on every frame.
    pub fn tick(&mut self, doc: &mut Document, now: Instant) -> Result<()> {
        let Some(mounted) = self.mounted.as_mut() else {
            return Ok(());
        };
        let phase = mounted.phase;
        match phase {
            Phase::Completed { fade_at } if now >= fade_at => {
                doc.add_class(mounted.node, class::FADING_OUT)?;
                mounted.phase = Phase::FadingOut {
                    remove_at: now + PROGRESS_REMOVAL_DELAY,
                };
            }
            Phase::FadingOut { remove_at } if now >= remove_at => {
                self.remove(doc)?;
            }
            _ => {}
        }
        Ok(())
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match self.mounted.as_ref()?.phase {
            Phase::Running => None,
            Phase::Completed { fade_at } => Some(fade_at),
            Phase::FadingOut { remove_at } => Some(remove_at),
        }
    }

    pub fn remove(&mut self, doc: &mut Document) -> Result<()> {
        if let Some(mounted) = self.mounted.take() {
            if doc.parent(mounted.node).is_some() {
                doc.remove(mounted.node)?;
            }
        }
        Ok(())
    }
}

fn append_div(doc: &mut Document, parent: NodeId, class: &str) -> Result<NodeId> {
    let node = doc.create_element("div");
    doc.add_class(node, class)?;
    doc.append_child(parent, node)?;
    Ok(node)
}

fn mount_point(doc: &Document) -> NodeId {
    Selector::parse("body")
        .ok()
        .and_then(|body| doc.query_selector(doc.root(), &body))
        .unwrap_or_else(|| doc.root())
}
