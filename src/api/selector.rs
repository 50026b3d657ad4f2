//! Selector bodies for `find` endpoints and reports

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    #[serde(rename = "EQUALS")]
    Equals,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "CONTAINS")]
    Contains,
    #[serde(rename = "LESS_THAN")]
    LessThan,
    #[serde(rename = "GREATER_THAN")]
    GreaterThan,
    #[serde(rename = "STARTSWITH")]
    StartsWith,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortOrder {
    #[serde(rename = "ASCENDING")]
    Ascending,
    #[serde(rename = "DESCENDING")]
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBy {
    pub field: String,
    pub sort_order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Paging {
    pub offset: u32,
    pub limit: u32,
}

/// Filter, order and page a `find` or report request
///
/// ```
/// use asa::api::selector::Selector;
///
/// let selector = Selector::new()
///     .where_eq("status", "ENABLED")
///     .limit(100);
/// assert_eq!(selector.conditions.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selector {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Paging>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(mut self, field: &str, operator: Operator, values: Vec<String>) -> Self {
        self.conditions.push(Condition {
            field: field.to_string(),
            operator,
            values,
        });
        self
    }

    pub fn where_eq(self, field: &str, value: impl ToString) -> Self {
        self.condition(field, Operator::Equals, vec![value.to_string()])
    }

    pub fn where_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let values = values.into_iter().map(|v| v.to_string()).collect();
        self.condition(field, Operator::In, values)
    }

    pub fn order_by(mut self, field: &str, sort_order: SortOrder) -> Self {
        self.order_by.push(OrderBy {
            field: field.to_string(),
            sort_order,
        });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        let offset = self.pagination.map(|p| p.offset).unwrap_or(0);
        self.pagination = Some(Paging { offset, limit });
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        let limit = self.pagination.map(|p| p.limit).unwrap_or(1000);
        self.pagination = Some(Paging { offset, limit });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_selector_json() {
        let selector = Selector::new()
            .where_eq("status", "ENABLED")
            .where_in("campaignId", [1, 2])
            .order_by("impressions", SortOrder::Descending)
            .offset(20)
            .limit(50);
        assert_eq!(
            serde_json::to_value(&selector).unwrap(),
            json!({
                "conditions": [
                    {"field": "status", "operator": "EQUALS", "values": ["ENABLED"]},
                    {"field": "campaignId", "operator": "IN", "values": ["1", "2"]}
                ],
                "orderBy": [{"field": "impressions", "sortOrder": "DESCENDING"}],
                "pagination": {"offset": 20, "limit": 50}
            })
        );
    }

    #[test]
    fn test_empty_selector_is_empty_object() {
        assert_eq!(serde_json::to_value(Selector::new()).unwrap(), json!({}));
    }
}
