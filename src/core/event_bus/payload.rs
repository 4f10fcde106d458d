//=========================================================================
// Event Payload
//=========================================================================
//
// Value carried by one bus emission.
//
// The bus only interprets two shapes itself: `Flag` for boolean state
// events and `Actions` for the prompt list. Everything else travels as an
// opaque shared value the receiving layer downcasts.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::any::Any;
use std::rc::Rc;

//=== Internal Dependencies ===============================================

use crate::core::input::ActionDescriptor;

//=== Payload =============================================================

#[derive(Debug, Clone, Default)]
pub enum Payload {
    /// No value. Panel events use this to mean "closed".
    #[default]
    Empty,

    Flag(bool),

    /// Ordered list of displayable actions.
    Actions(Vec<ActionDescriptor>),

    /// Any value owned by the embedding layers.
    Opaque(Rc<dyn Any>),
}

impl Payload {
    /// Wraps an arbitrary value.
    pub fn opaque<T: Any>(value: T) -> Self {
        Self::Opaque(Rc::new(value))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_actions(&self) -> Option<&[ActionDescriptor]> {
        match self {
            Self::Actions(actions) => Some(actions),
            _ => None,
        }
    }

    /// Borrows an opaque value as `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Opaque(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl From<bool> for Payload {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<Vec<ActionDescriptor>> for Payload {
    fn from(actions: Vec<ActionDescriptor>) -> Self {
        Self::Actions(actions)
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
