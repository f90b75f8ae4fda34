use crate::{
    client::Client,
    common::{
        self,
        clause::Clauses,
        condition::{Conditional, Where},
        expression::ClauseKind,
    },
    error::{Error, Result},
    model::Model,
    pagination::Paginator,
    read,
};

use aws_sdk_dynamodb::{operation::scan::ScanInput, types};
use futures::{Stream, StreamExt};
use std::marker;

/// Scan operation.
///
/// ```rust,no_run
/// # use dynamodb_odm::{Client, Model};
/// # async fn example<M: Model, C: Client>(client: &C) -> dynamodb_odm::Result<()> {
/// let stale = M::scan(client)
///     .filter("updated_at").lt("2024-01-01")
///     .segment(0, 4)
///     .execute()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Scan<'c, M, C: ?Sized> {
    client: &'c C,
    count: bool,
    exclusive_start_key: Option<common::Item>,
    index_name: Option<String>,
    limit: Option<i32>,
    read_args: read::common::ReadArgs,
    segment: Option<(i32, i32)>,
    model: marker::PhantomData<fn() -> M>,
}

impl<'c, M: Model, C: Client + ?Sized> Scan<'c, M, C> {
    pub(crate) fn new(client: &'c C) -> Self {
        Self {
            client,
            count: false,
            exclusive_start_key: None,
            index_name: None,
            limit: None,
            read_args: read::common::ReadArgs::default(),
            segment: None,
            model: marker::PhantomData,
        }
    }

    read::common::read_args_methods!();

    /// Start a filter on the attribute at `path`.
    pub fn filter(self, path: impl Into<String>) -> Where<Self> {
        self.condition(path)
    }

    /// Scan the secondary index `index_name`.
    pub fn index(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = Some(index_name.into());
        self
    }

    /// Evaluate at most `limit` items per page.
    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Only scan `segment` out of `total_segments` (parallel scan).
    pub fn segment(mut self, segment: i32, total_segments: i32) -> Self {
        self.segment = Some((segment, total_segments));
        self
    }

    /// Only count the matching items; cannot be combined with `select`.
    pub fn count(mut self) -> Self {
        self.count = true;
        self
    }

    /// Resume after `last_evaluated_key` of a previous page.
    pub fn start_key(mut self, last_evaluated_key: common::Item) -> Self {
        self.exclusive_start_key = Some(last_evaluated_key);
        self
    }

    /// Serialize the accumulated state into the request of the first page.
    pub fn to_request(&self) -> Result<ScanInput> {
        let clauses = &self.read_args.clauses;
        clauses.check()?;
        if let Some((segment, total_segments)) = self.segment
            && !(0..total_segments).contains(&segment)
        {
            return Err(Error::Schema(format!(
                "segment {segment} out of range for {total_segments} segments"
            )));
        }
        M::schema().key_schema(self.index_name.as_deref())?;
        if self.count && !clauses.is_empty(ClauseKind::Projection) {
            return Err(Error::Conflict("`count` cannot be combined with `select`"));
        }
        let input = ScanInput::builder()
            .table_name(self.read_args.table_name::<M>())
            .set_index_name(self.index_name.clone())
            .set_filter_expression(clauses.condition(ClauseKind::Filter))
            .set_projection_expression(clauses.projection())
            .set_expression_attribute_names(clauses.names())
            .set_expression_attribute_values(clauses.values())
            .set_consistent_read(self.read_args.consistent_read)
            .set_exclusive_start_key(self.exclusive_start_key.clone())
            .set_limit(self.limit)
            .set_segment(self.segment.map(|(segment, _)| segment))
            .set_total_segments(self.segment.map(|(_, total_segments)| total_segments))
            .set_select(self.count.then_some(types::Select::Count))
            .return_consumed_capacity(self.read_args.return_consumed_capacity.clone())
            .build()?;
        Ok(input)
    }

    /// Lazy stream of pages; a page is only requested when the stream is polled.
    pub fn pages(
        &self,
    ) -> Result<impl Stream<Item = Result<read::common::Page<M>>> + use<'c, M, C>> {
        let input = self.to_request()?;
        let pages = Paginator::new(self.client, input)
            .into_stream()
            .map(|output| output.and_then(read::common::Page::try_from));
        Ok(pages)
    }

    /// Execute the scan, following every page.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "dynamodb_odm.scan", skip_all, err)
    )]
    pub async fn execute(&self) -> Result<read::common::Items<M>> {
        read::common::collect(self.pages()?).await
    }
}

impl<M, C: ?Sized> Conditional for Scan<'_, M, C> {
    fn clauses(&mut self) -> &mut Clauses {
        &mut self.read_args.clauses
    }

    fn condition_kind(&self) -> ClauseKind {
        ClauseKind::Filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::{
        config::Config,
        mock::{Event, MockClient, Response, User, item, n, s},
    };
    use aws_sdk_dynamodb::operation::scan::ScanOutput;
    use rstest::rstest;
    use std::collections;

    fn consumed_capacity() -> types::ReturnConsumedCapacity {
        Config::global().return_consumed_capacity.clone()
    }

    #[rstest]
    #[case::empty(
        User::scan(&MockClient::default()).to_request().unwrap(),
        ScanInput::builder()
            .table_name("users")
            .return_consumed_capacity(consumed_capacity())
            .build()
            .unwrap()
    )]
    #[case::full(
        Event::scan(&MockClient::default())
            .index("by_kind")
            .filter("kind").begins_with("log")
            .or(|group| group.condition("retries").gte(3).condition("retries").not().exists())
            .select(["kind", "at"])
            .limit(100)
            .segment(1, 4)
            .consistent_read(true)
            .table("events_archive")
            .start_key(item([("kind", s("login"))]))
            .return_consumed_capacity(types::ReturnConsumedCapacity::Indexes)
            .to_request()
            .unwrap(),
        ScanInput::builder()
            .table_name("events_archive")
            .index_name("by_kind")
            .filter_expression(
                "begins_with(#filter0_kind_0, :filter0_kind) AND \
                 (#filter0_retries_0 >= :filter0_retries OR attribute_not_exists(#filter1_retries_0))"
            )
            .projection_expression("#projection0_kind_0, #projection0_at_0")
            .set_expression_attribute_names(
                Some(
                    collections::HashMap::from(
                        [
                            ("#filter0_kind_0".to_string(), "kind".to_string()),
                            ("#filter0_retries_0".to_string(), "retries".to_string()),
                            ("#filter1_retries_0".to_string(), "retries".to_string()),
                            ("#projection0_kind_0".to_string(), "kind".to_string()),
                            ("#projection0_at_0".to_string(), "at".to_string()),
                        ]
                    )
                )
            )
            .set_expression_attribute_values(
                Some(
                    collections::HashMap::from(
                        [
                            (":filter0_kind".to_string(), s("log")),
                            (":filter0_retries".to_string(), n("3")),
                        ]
                    )
                )
            )
            .consistent_read(true)
            .exclusive_start_key("kind", s("login"))
            .limit(100)
            .segment(1)
            .total_segments(4)
            .return_consumed_capacity(types::ReturnConsumedCapacity::Indexes)
            .build()
            .unwrap()
    )]
    fn test_scan(#[case] actual: ScanInput, #[case] expected: ScanInput) {
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[case::segment_too_large(User::scan(&MockClient::default()).segment(4, 4).to_request())]
    #[case::negative_segment(User::scan(&MockClient::default()).segment(-1, 4).to_request())]
    #[case::unknown_index(User::scan(&MockClient::default()).index("by_kind").to_request())]
    fn test_schema_errors(#[case] actual: Result<ScanInput>) {
        assert!(matches!(actual, Err(Error::Schema(_))));
    }

    #[test]
    fn test_count_with_select_is_rejected() {
        let client = MockClient::default();
        let actual = User::scan(&client).select(["name"]).count().to_request();
        assert!(matches!(actual, Err(Error::Conflict(_))));
        let request = User::scan(&client).count().to_request().unwrap();
        assert_eq!(request.select, Some(types::Select::Count));
        assert_eq!(request.projection_expression, None);
    }

    #[tokio::test]
    async fn test_execute_counts() {
        let client = MockClient::new([
            Response::Scan(
                ScanOutput::builder()
                    .count(2)
                    .scanned_count(5)
                    .set_last_evaluated_key(Some(item([("id", s("5"))])))
                    .build(),
            ),
            Response::Scan(ScanOutput::builder().count(1).scanned_count(3).build()),
        ]);
        let items = User::scan(&client).count().execute().await.unwrap();
        assert!(items.items.is_empty());
        assert_eq!(items.count, 3);
        assert_eq!(items.scanned_count, 8);
        assert_eq!(client.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_page_fails_execute() {
        let client = MockClient::new([
            Response::Scan(
                ScanOutput::builder()
                    .set_last_evaluated_key(Some(item([("id", s("5"))])))
                    .build(),
            ),
            Response::not_found(),
        ]);
        let actual = User::scan(&client).execute().await;
        assert!(matches!(actual, Err(Error::Client(_))));
        assert_eq!(client.requests().len(), 2);
    }
}
