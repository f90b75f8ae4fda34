//! Database capability consumed by the builders.
//!
//! Builders never talk to the AWS SDK directly: they serialize a request and hand it
//! to a [`Client`]. The SDK client implements it, and so can any test double.

use aws_sdk_dynamodb::{
    Error,
    operation::{
        batch_get_item::{BatchGetItemInput, BatchGetItemOutput},
        batch_write_item::{BatchWriteItemInput, BatchWriteItemOutput},
        delete_item::{DeleteItemInput, DeleteItemOutput},
        get_item::{GetItemInput, GetItemOutput},
        put_item::{PutItemInput, PutItemOutput},
        query::{QueryInput, QueryOutput},
        scan::{ScanInput, ScanOutput},
        update_item::{UpdateItemInput, UpdateItemOutput},
    },
};
use std::sync;

/// The eight DynamoDB operations the builders dispatch to.
///
/// Errors are returned as they come from the service; nothing here retries.
#[async_trait::async_trait]
pub trait Client: Send + Sync {
    /// PutItem.
    async fn put(&self, input: PutItemInput) -> Result<PutItemOutput, Error>;
    /// GetItem.
    async fn get(&self, input: GetItemInput) -> Result<GetItemOutput, Error>;
    /// Query, one page.
    async fn query(&self, input: QueryInput) -> Result<QueryOutput, Error>;
    /// Scan, one page.
    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, Error>;
    /// UpdateItem.
    async fn update(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, Error>;
    /// DeleteItem.
    async fn delete(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, Error>;
    /// BatchGetItem, one round.
    async fn batch_get(&self, input: BatchGetItemInput) -> Result<BatchGetItemOutput, Error>;
    /// BatchWriteItem, one round.
    async fn batch_write(&self, input: BatchWriteItemInput)
    -> Result<BatchWriteItemOutput, Error>;
}

/// apply common write input fields to a fluent builder
macro_rules! apply_write_input {
    ($builder:expr, $input:expr) => {
        $builder
            .set_condition_expression($input.condition_expression)
            .set_expression_attribute_names($input.expression_attribute_names)
            .set_expression_attribute_values($input.expression_attribute_values)
            .set_return_consumed_capacity($input.return_consumed_capacity)
            .set_return_item_collection_metrics($input.return_item_collection_metrics)
            .set_return_values($input.return_values)
            .set_return_values_on_condition_check_failure(
                $input.return_values_on_condition_check_failure,
            )
            .set_table_name($input.table_name)
    };
}

/// apply common query and scan input fields to a fluent builder
macro_rules! apply_multiple_read_input {
    ($builder:expr, $input:expr) => {
        $builder
            .set_consistent_read($input.consistent_read)
            .set_exclusive_start_key($input.exclusive_start_key)
            .set_expression_attribute_names($input.expression_attribute_names)
            .set_expression_attribute_values($input.expression_attribute_values)
            .set_filter_expression($input.filter_expression)
            .set_index_name($input.index_name)
            .set_limit($input.limit)
            .set_projection_expression($input.projection_expression)
            .set_return_consumed_capacity($input.return_consumed_capacity)
            .set_select($input.select)
            .set_table_name($input.table_name)
    };
}

#[async_trait::async_trait]
impl Client for aws_sdk_dynamodb::Client {
    async fn put(&self, input: PutItemInput) -> Result<PutItemOutput, Error> {
        let builder = aws_sdk_dynamodb::Client::put_item(self).set_item(input.item);
        let output = apply_write_input!(builder, input).send().await?;
        Ok(output)
    }

    async fn get(&self, input: GetItemInput) -> Result<GetItemOutput, Error> {
        let output = aws_sdk_dynamodb::Client::get_item(self)
            .set_consistent_read(input.consistent_read)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_key(input.key)
            .set_projection_expression(input.projection_expression)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .set_table_name(input.table_name)
            .send()
            .await?;
        Ok(output)
    }

    async fn query(&self, input: QueryInput) -> Result<QueryOutput, Error> {
        let builder = aws_sdk_dynamodb::Client::query(self)
            .set_key_condition_expression(input.key_condition_expression)
            .set_scan_index_forward(input.scan_index_forward);
        let output = apply_multiple_read_input!(builder, input).send().await?;
        Ok(output)
    }

    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, Error> {
        let builder = aws_sdk_dynamodb::Client::scan(self)
            .set_segment(input.segment)
            .set_total_segments(input.total_segments);
        let output = apply_multiple_read_input!(builder, input).send().await?;
        Ok(output)
    }

    async fn update(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, Error> {
        let builder = aws_sdk_dynamodb::Client::update_item(self)
            .set_key(input.key)
            .set_update_expression(input.update_expression);
        let output = apply_write_input!(builder, input).send().await?;
        Ok(output)
    }

    async fn delete(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, Error> {
        let builder = aws_sdk_dynamodb::Client::delete_item(self).set_key(input.key);
        let output = apply_write_input!(builder, input).send().await?;
        Ok(output)
    }

    async fn batch_get(&self, input: BatchGetItemInput) -> Result<BatchGetItemOutput, Error> {
        let output = aws_sdk_dynamodb::Client::batch_get_item(self)
            .set_request_items(input.request_items)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .send()
            .await?;
        Ok(output)
    }

    async fn batch_write(
        &self,
        input: BatchWriteItemInput,
    ) -> Result<BatchWriteItemOutput, Error> {
        let output = aws_sdk_dynamodb::Client::batch_write_item(self)
            .set_request_items(input.request_items)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .set_return_item_collection_metrics(input.return_item_collection_metrics)
            .send()
            .await?;
        Ok(output)
    }
}

#[async_trait::async_trait]
impl<T: Client + ?Sized> Client for sync::Arc<T> {
    async fn put(&self, input: PutItemInput) -> Result<PutItemOutput, Error> {
        (**self).put(input).await
    }

    async fn get(&self, input: GetItemInput) -> Result<GetItemOutput, Error> {
        (**self).get(input).await
    }

    async fn query(&self, input: QueryInput) -> Result<QueryOutput, Error> {
        (**self).query(input).await
    }

    async fn scan(&self, input: ScanInput) -> Result<ScanOutput, Error> {
        (**self).scan(input).await
    }

    async fn update(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, Error> {
        (**self).update(input).await
    }

    async fn delete(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, Error> {
        (**self).delete(input).await
    }

    async fn batch_get(&self, input: BatchGetItemInput) -> Result<BatchGetItemOutput, Error> {
        (**self).batch_get(input).await
    }

    async fn batch_write(
        &self,
        input: BatchWriteItemInput,
    ) -> Result<BatchWriteItemOutput, Error> {
        (**self).batch_write(input).await
    }
}
