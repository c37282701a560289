//! Use case inputs.

use common::{CheckoutId, GearItemId, GearTypeId, MemberId, StaffMemberId};
use domain::Condition;
use serde::{Deserialize, Serialize};

/// One line of a checkout being requested, before catalog resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckoutLineRequest {
    /// An individual item identified by the code on its tag.
    ItemCode { code: String },

    /// An individual item identified by id.
    Item { gear_item_id: GearItemId },

    /// A quantity of a bulk-tracked type.
    Bulk {
        gear_type_id: GearTypeId,
        quantity: u32,
    },
}

impl CheckoutLineRequest {
    pub fn by_code(code: impl Into<String>) -> Self {
        CheckoutLineRequest::ItemCode { code: code.into() }
    }

    pub fn by_id(gear_item_id: GearItemId) -> Self {
        CheckoutLineRequest::Item { gear_item_id }
    }

    pub fn bulk(gear_type_id: GearTypeId, quantity: u32) -> Self {
        CheckoutLineRequest::Bulk {
            gear_type_id,
            quantity,
        }
    }
}

/// Command to lend equipment to a member.
#[derive(Debug, Clone)]
pub struct CreateCheckout {
    pub member_id: MemberId,
    pub staff_member_id: StaffMemberId,
    pub lines: Vec<CheckoutLineRequest>,
    pub notes: Option<String>,
}

impl CreateCheckout {
    /// Creates a new CreateCheckout command with no lines.
    pub fn new(member_id: MemberId, staff_member_id: StaffMemberId) -> Self {
        Self {
            member_id,
            staff_member_id,
            lines: Vec::new(),
            notes: None,
        }
    }

    pub fn with_line(mut self, line: CheckoutLineRequest) -> Self {
        self.lines.push(line);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Command for a quick return of a single item scanned at the desk.
#[derive(Debug, Clone)]
pub struct ReturnItemByCode {
    pub code: String,
    pub condition: Condition,
    pub notes: Option<String>,
}

impl ReturnItemByCode {
    pub fn new(code: impl Into<String>, condition: Condition) -> Self {
        Self {
            code: code.into(),
            condition,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// One return within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReturnRequest {
    Individual {
        gear_item_id: GearItemId,
        condition: Condition,
        notes: Option<String>,
    },
    Bulk {
        gear_type_id: GearTypeId,
        quantity: u32,
        notes: Option<String>,
    },
}

impl ReturnRequest {
    pub fn individual(gear_item_id: GearItemId, condition: Condition) -> Self {
        ReturnRequest::Individual {
            gear_item_id,
            condition,
            notes: None,
        }
    }

    pub fn bulk(gear_type_id: GearTypeId, quantity: u32) -> Self {
        ReturnRequest::Bulk {
            gear_type_id,
            quantity,
            notes: None,
        }
    }

    /// Attaches a return note.
    pub fn with_notes(self, text: impl Into<String>) -> Self {
        let text = Some(text.into());
        match self {
            ReturnRequest::Individual {
                gear_item_id,
                condition,
                ..
            } => ReturnRequest::Individual {
                gear_item_id,
                condition,
                notes: text,
            },
            ReturnRequest::Bulk {
                gear_type_id,
                quantity,
                ..
            } => ReturnRequest::Bulk {
                gear_type_id,
                quantity,
                notes: text,
            },
        }
    }
}

/// Command to reconcile several returns against one checkout at once.
#[derive(Debug, Clone)]
pub struct ReturnBatch {
    pub checkout_id: CheckoutId,
    pub requests: Vec<ReturnRequest>,
}

impl ReturnBatch {
    pub fn new(checkout_id: CheckoutId) -> Self {
        Self {
            checkout_id,
            requests: Vec::new(),
        }
    }

    pub fn with(mut self, request: ReturnRequest) -> Self {
        self.requests.push(request);
        self
    }
}
