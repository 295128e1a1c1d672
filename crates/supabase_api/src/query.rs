//! PostgREST query-string builders.
//!
//! Filters follow the PostgREST horizontal-filtering grammar
//! (`column=op.value`); only the operators the relay client needs are
//! exposed.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }
}

/// One horizontal filter, e.g. `room_id=eq.42`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    column: String,
    expression: String,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl AsRef<str>) -> Self {
        Self {
            column: column.into(),
            expression: format!("eq.{}", value.as_ref()),
        }
    }

    pub fn gt(column: impl Into<String>, value: impl AsRef<str>) -> Self {
        Self {
            column: column.into(),
            expression: format!("gt.{}", value.as_ref()),
        }
    }

    /// `in` filter. Values are double-quoted so ids containing reserved
    /// characters (`,` `.` `(` `)`) survive.
    pub fn in_list<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let quoted: Vec<String> = values
            .into_iter()
            .map(|value| quote_value(value.as_ref()))
            .collect();
        Self {
            column: column.into(),
            expression: format!("in.({})", quoted.join(",")),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn query_pair(&self) -> (String, String) {
        (self.column.clone(), self.expression.clone())
    }
}

/// Read query against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    table: String,
    columns: String,
    filters: Vec<Filter>,
    order: Option<(String, Direction)>,
    limit: Option<usize>,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: "*".to_owned(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Column list, including embedded relations such as
    /// `content,profiles(username)`.
    pub fn columns(mut self, columns: impl Into<String>) -> Self {
        self.columns = columns.into();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn gt(self, column: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.filter(Filter::gt(column, value))
    }

    pub fn in_list<I, S>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter(Filter::in_list(column, values))
    }

    pub fn order(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some((column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Query pairs in a stable order: `select`, filters, `order`, `limit`.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_owned(), self.columns.clone())];
        pairs.extend(self.filters.iter().map(Filter::query_pair));
        if let Some((column, direction)) = &self.order {
            pairs.push(("order".to_owned(), format!("{column}.{}", direction.as_str())));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_owned(), limit.to_string()));
        }
        pairs
    }
}

fn quote_value(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
