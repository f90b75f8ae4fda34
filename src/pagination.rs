//! Pull-based pagination over continuation tokens and unprocessed batch items.
//!
//! A [`Paginator`] issues one request per [`Paginator::next_page`] call and never
//! reads ahead. The first request is always sent, so even an empty table yields one
//! page. Dropping the paginator (or its stream) issues nothing further.

use crate::{client::Client, error::Result};

use aws_sdk_dynamodb::{
    operation::{
        batch_get_item::{BatchGetItemInput, BatchGetItemOutput},
        batch_write_item::{BatchWriteItemInput, BatchWriteItemOutput},
        query::{QueryInput, QueryOutput},
        scan::{ScanInput, ScanOutput},
    },
    types,
};
use futures::{Stream, future::BoxFuture, stream};
use std::collections;

/// Per-table request items of one batch round.
pub type RequestItems<T> = collections::HashMap<String, T>;

/// A request that can be sent and, given its response, turned into the next request.
pub trait Paginate: Clone + Send + Sync {
    /// Raw response of one page.
    type Output: Send;

    /// Operation name used in diagnostics.
    const OPERATION: &'static str;

    /// Send this request through `client`.
    fn send<'a, C: Client + ?Sized>(
        &self,
        client: &'a C,
    ) -> BoxFuture<'a, Result<Self::Output, aws_sdk_dynamodb::Error>>;

    /// The request for the following page, or `None` when the sequence is exhausted.
    fn advance(&self, output: &Self::Output) -> Option<Self>;
}

fn continues(last_evaluated_key: Option<&crate::common::Item>) -> bool {
    last_evaluated_key.is_some_and(|key| !key.is_empty())
}

impl Paginate for QueryInput {
    type Output = QueryOutput;

    const OPERATION: &'static str = "query";

    fn send<'a, C: Client + ?Sized>(
        &self,
        client: &'a C,
    ) -> BoxFuture<'a, Result<Self::Output, aws_sdk_dynamodb::Error>> {
        client.query(self.clone())
    }

    fn advance(&self, output: &Self::Output) -> Option<Self> {
        if !continues(output.last_evaluated_key.as_ref()) {
            return None;
        }
        let mut next = self.clone();
        next.exclusive_start_key = output.last_evaluated_key.clone();
        Some(next)
    }
}

impl Paginate for ScanInput {
    type Output = ScanOutput;

    const OPERATION: &'static str = "scan";

    fn send<'a, C: Client + ?Sized>(
        &self,
        client: &'a C,
    ) -> BoxFuture<'a, Result<Self::Output, aws_sdk_dynamodb::Error>> {
        client.scan(self.clone())
    }

    fn advance(&self, output: &Self::Output) -> Option<Self> {
        if !continues(output.last_evaluated_key.as_ref()) {
            return None;
        }
        let mut next = self.clone();
        next.exclusive_start_key = output.last_evaluated_key.clone();
        Some(next)
    }
}

/// A BatchGetItem round plus the chunks still waiting to be sent.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchGetRequest {
    /// Request of the current round.
    pub input: BatchGetItemInput,
    /// Chunks queued behind the current round.
    pub pending: collections::VecDeque<RequestItems<types::KeysAndAttributes>>,
}

impl Paginate for BatchGetRequest {
    type Output = BatchGetItemOutput;

    const OPERATION: &'static str = "batch_get";

    fn send<'a, C: Client + ?Sized>(
        &self,
        client: &'a C,
    ) -> BoxFuture<'a, Result<Self::Output, aws_sdk_dynamodb::Error>> {
        client.batch_get(self.input.clone())
    }

    fn advance(&self, output: &Self::Output) -> Option<Self> {
        let mut pending = self.pending.clone();
        let request_items = match &output.unprocessed_keys {
            Some(unprocessed) if !unprocessed.is_empty() => unprocessed.clone(),
            _ => pending.pop_front()?,
        };
        let mut input = self.input.clone();
        input.request_items = Some(request_items);
        Some(Self { input, pending })
    }
}

/// A BatchWriteItem round plus the chunks still waiting to be sent.
#[derive(Clone, Debug, PartialEq)]
pub struct BatchWriteRequest {
    /// Request of the current round.
    pub input: BatchWriteItemInput,
    /// Chunks queued behind the current round.
    pub pending: collections::VecDeque<RequestItems<Vec<types::WriteRequest>>>,
}

impl Paginate for BatchWriteRequest {
    type Output = BatchWriteItemOutput;

    const OPERATION: &'static str = "batch_write";

    fn send<'a, C: Client + ?Sized>(
        &self,
        client: &'a C,
    ) -> BoxFuture<'a, Result<Self::Output, aws_sdk_dynamodb::Error>> {
        client.batch_write(self.input.clone())
    }

    fn advance(&self, output: &Self::Output) -> Option<Self> {
        let mut pending = self.pending.clone();
        let request_items = match &output.unprocessed_items {
            Some(unprocessed) if !unprocessed.is_empty() => unprocessed.clone(),
            _ => pending.pop_front()?,
        };
        let mut input = self.input.clone();
        input.request_items = Some(request_items);
        Some(Self { input, pending })
    }
}

/// Lazy, forward-only sequence of pages.
///
/// ```rust,no_run
/// use aws_sdk_dynamodb::operation::scan::ScanInput;
/// use dynamodb_odm::pagination::Paginator;
///
/// # async fn example(client: &aws_sdk_dynamodb::Client) -> dynamodb_odm::Result<()> {
/// let input = ScanInput::builder().table_name("users").build()?;
/// let mut paginator = Paginator::new(client, input);
/// while paginator.has_more() {
///     if let Some(page) = paginator.next_page().await {
///         println!("{} items", page?.count);
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Paginator<'c, C: ?Sized, R> {
    client: &'c C,
    next: Option<R>,
    page: usize,
}

impl<'c, C: Client + ?Sized, R: Paginate> Paginator<'c, C, R> {
    /// Paginator starting at `request`.
    pub fn new(client: &'c C, request: R) -> Self {
        Self::resume(client, Some(request))
    }

    /// Paginator starting at `next`; `None` yields no page at all.
    pub(crate) fn resume(client: &'c C, next: Option<R>) -> Self {
        Self {
            client,
            next,
            page: 0,
        }
    }

    /// Whether another page can be requested.
    pub fn has_more(&self) -> bool {
        self.next.is_some()
    }

    /// Number of pages requested so far.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Request the next page.
    ///
    /// Returns `None` once the sequence is exhausted. A failed request is returned
    /// once and ends the sequence.
    pub async fn next_page(&mut self) -> Option<Result<R::Output>> {
        let request = self.next.take()?;
        self.page += 1;
        #[cfg(feature = "tracing")]
        tracing::debug!(operation = R::OPERATION, page = self.page, "requesting page");
        match request.send(self.client).await {
            Ok(output) => {
                self.next = request.advance(&output);
                Some(Ok(output))
            }
            Err(error) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(operation = R::OPERATION, page = self.page, %error, "page failed");
                Some(Err(error.into()))
            }
        }
    }

    /// Turn the paginator into a stream of pages.
    pub fn into_stream(self) -> impl Stream<Item = Result<R::Output>> + 'c
    where
        R: 'c,
    {
        stream::unfold(self, |mut paginator| async move {
            let page = paginator.next_page().await?;
            Some((page, paginator))
        })
    }
}
