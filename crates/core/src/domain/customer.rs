use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub i64);

/// A row of the `customer` table.
///
/// Every attribute except the id is nullable in storage. `None` means the
/// column is SQL `NULL`, which is distinct from `Some(String::new())`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub patronymic_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub id: CustomerId,
}

impl Customer {
    pub fn new(id: CustomerId) -> Self {
        Self {
            first_name: None,
            last_name: None,
            patronymic_name: None,
            phone: None,
            email: None,
            id,
        }
    }
}

/// Outcome of a prefix delete: the ids captured inside the delete
/// transaction, in ascending order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub count: usize,
    pub ids: Vec<CustomerId>,
}

impl DeleteResult {
    pub fn from_ids(ids: Vec<CustomerId>) -> Self {
        Self { count: ids.len(), ids }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
