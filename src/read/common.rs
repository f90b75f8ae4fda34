use crate::{
    common::{
        self,
        clause::Clauses,
        expression::{ClauseKind, Operand, Operator},
    },
    config::Config,
    error::Result,
    model::Model,
};

use aws_sdk_dynamodb::{
    operation::{query::QueryOutput, scan::ScanOutput},
    types,
};
use futures::{Stream, TryStreamExt, pin_mut};
use serde::de::DeserializeOwned;
use serde_dynamo::from_item;

/// Arguments shared by every read builder.
#[derive(Clone, Debug)]
pub(crate) struct ReadArgs {
    pub(crate) clauses: Clauses,
    pub(crate) consistent_read: Option<bool>,
    pub(crate) return_consumed_capacity: types::ReturnConsumedCapacity,
    pub(crate) table_name: Option<String>,
}

impl Default for ReadArgs {
    fn default() -> Self {
        Self {
            clauses: Clauses::default(),
            consistent_read: None,
            return_consumed_capacity: Config::global().return_consumed_capacity.clone(),
            table_name: None,
        }
    }
}

impl ReadArgs {
    pub(crate) fn table_name<M: Model>(&self) -> String {
        self.table_name
            .clone()
            .unwrap_or_else(|| M::schema().table_name.clone())
    }

    pub(crate) fn select<P: AsRef<str>>(&mut self, paths: impl IntoIterator<Item = P>) {
        for path in paths {
            self.clauses.push(
                ClauseKind::Projection,
                path.as_ref(),
                Operator::Path,
                Ok(Operand::None),
            );
        }
    }
}

/// generate the setters shared by every read builder
macro_rules! read_args_methods {
    () => {
        /// Read from `table_name` instead of the model's table.
        pub fn table(mut self, table_name: impl Into<String>) -> Self {
            self.read_args.table_name = Some(table_name.into());
            self
        }

        /// Use strongly (`true`) or eventually (`false`) consistent reads.
        pub fn consistent_read(mut self, consistent_read: bool) -> Self {
            self.read_args.consistent_read = Some(consistent_read);
            self
        }

        /// Override the consumed capacity level from the configuration.
        pub fn return_consumed_capacity(
            mut self,
            return_consumed_capacity: aws_sdk_dynamodb::types::ReturnConsumedCapacity,
        ) -> Self {
            self.read_args.return_consumed_capacity = return_consumed_capacity;
            self
        }

        /// Only retrieve the attributes at `paths`.
        pub fn select<P: AsRef<str>>(mut self, paths: impl IntoIterator<Item = P>) -> Self {
            self.read_args.select(paths);
            self
        }
    };
}
pub(crate) use read_args_methods;

/// One page of a query or a scan.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<M> {
    /// Items of the page; empty when only counting.
    pub items: Vec<M>,
    /// Number of items matching the filter.
    pub count: i32,
    /// Number of items evaluated before filtering.
    pub scanned_count: i32,
    /// Capacity consumed by the page.
    pub consumed_capacity: Option<types::ConsumedCapacity>,
    /// Continuation token; `None` on the last page.
    pub last_evaluated_key: Option<common::Item>,
}

pub(crate) fn from_items<M: DeserializeOwned>(
    items: Option<Vec<common::Item>>,
) -> Result<Vec<M>> {
    let items = items
        .unwrap_or_default()
        .into_iter()
        .map(from_item)
        .collect::<Result<_, _>>()?;
    Ok(items)
}

impl<M: DeserializeOwned> TryFrom<QueryOutput> for Page<M> {
    type Error = crate::error::Error;

    fn try_from(output: QueryOutput) -> Result<Self> {
        let page = Self {
            items: from_items(output.items)?,
            count: output.count,
            scanned_count: output.scanned_count,
            consumed_capacity: output.consumed_capacity,
            last_evaluated_key: output.last_evaluated_key.filter(|key| !key.is_empty()),
        };
        Ok(page)
    }
}

impl<M: DeserializeOwned> TryFrom<ScanOutput> for Page<M> {
    type Error = crate::error::Error;

    fn try_from(output: ScanOutput) -> Result<Self> {
        let page = Self {
            items: from_items(output.items)?,
            count: output.count,
            scanned_count: output.scanned_count,
            consumed_capacity: output.consumed_capacity,
            last_evaluated_key: output.last_evaluated_key.filter(|key| !key.is_empty()),
        };
        Ok(page)
    }
}

/// All pages of a query or a scan, merged.
#[derive(Clone, Debug, PartialEq)]
pub struct Items<M> {
    /// Items of every page.
    pub items: Vec<M>,
    /// Sum of the page counts.
    pub count: i32,
    /// Sum of the page scanned counts.
    pub scanned_count: i32,
    /// Sum of the capacity consumed by every page.
    pub consumed_capacity: Option<types::ConsumedCapacity>,
}

/// Drain `pages`, failing on the first failed page.
pub(crate) async fn collect<M>(pages: impl Stream<Item = Result<Page<M>>>) -> Result<Items<M>> {
    pin_mut!(pages);
    let mut items = Vec::new();
    let mut count = 0;
    let mut scanned_count = 0;
    let mut capacities = Vec::new();
    while let Some(page) = pages.try_next().await? {
        items.extend(page.items);
        count += page.count;
        scanned_count += page.scanned_count;
        capacities.extend(page.consumed_capacity);
    }
    Ok(Items {
        items,
        count,
        scanned_count,
        consumed_capacity: aggregate_capacity(capacities),
    })
}

/// Sum capacities; `None` when nothing was reported.
pub(crate) fn aggregate_capacity(
    capacities: Vec<types::ConsumedCapacity>,
) -> Option<types::ConsumedCapacity> {
    if capacities.is_empty() {
        return None;
    }
    let (cap, read, write, table) = capacities.into_iter().fold(
        (0.0, 0.0, 0.0, None),
        |(cap, read, write, table), capacity| {
            (
                cap + capacity.capacity_units.unwrap_or(0.0),
                read + capacity.read_capacity_units.unwrap_or(0.0),
                write + capacity.write_capacity_units.unwrap_or(0.0),
                table.or(capacity.table_name),
            )
        },
    );
    let capacity = types::ConsumedCapacity::builder()
        .set_table_name(table)
        .set_capacity_units(Some(cap))
        .set_read_capacity_units(Some(read))
        .set_write_capacity_units(Some(write))
        .build();
    Some(capacity)
}
