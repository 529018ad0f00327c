//! Folder subscription module.
//!
//! This module contains the event subscriptions of a folder and the
//! retrieval of their events, either pulled in batches or streamed.

use log::{debug, info, trace};
use std::time::Duration;

use crate::{
    service, EventType, Folder, Notification, NotificationStream, Root, Service, Subscription,
};

use super::{Error, Result};

// Grace period added to the connection timeout of a streaming
// request, so that the server closes the connection first.
const STREAMING_GRACE_PERIOD: Duration = Duration::from_secs(60);

fn event_types_or_all(event_types: &[EventType]) -> &[EventType] {
    if event_types.is_empty() {
        &EventType::ALL
    } else {
        event_types
    }
}

fn into_single(results: Vec<service::Result<Subscription>>) -> Result<Subscription> {
    let mut results = results;
    if results.len() != 1 {
        return Err(Error::UnexpectedResultCount(results.len()));
    }
    let subscription = results.remove(0)?;
    debug!("subscription: {:?}", subscription);
    Ok(subscription)
}

/// Represents the batches of events of a pull subscription.
///
/// Each batch moves the watermark past its last event. The sequence
/// ends after the first batch reporting no more events.
pub struct Events<'a> {
    service: &'a dyn Service,
    subscription_id: String,
    watermark: String,
    is_done: bool,
}

impl<'a> Events<'a> {
    pub fn watermark(&self) -> &str {
        &self.watermark
    }
}

impl<'a> Iterator for Events<'a> {
    type Item = Result<Notification>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_done {
            return None;
        }

        debug!(
            "getting events of subscription {} from watermark {}",
            self.subscription_id, self.watermark
        );
        match self
            .service
            .get_events(&self.subscription_id, &self.watermark)
        {
            Ok(notification) => {
                trace!("notification: {:#?}", notification);
                if let Some(watermark) = notification
                    .events
                    .last()
                    .and_then(|event| event.watermark.clone())
                {
                    self.watermark = watermark;
                }
                self.is_done = !notification.more_events;
                Some(Ok(notification))
            }
            Err(err) => {
                self.is_done = true;
                Some(Err(err.into()))
            }
        }
    }
}

/// Represents the notifications of streaming subscriptions.
///
/// Once the server closes the connection, or once the maximum number
/// of notifications is reached, the subscriptions the server reported
/// as invalid are returned as a last error.
pub struct StreamingEvents<'a> {
    stream: Box<dyn NotificationStream + 'a>,
    max_notifications: Option<usize>,
    count: usize,
    is_done: bool,
}

impl<'a> StreamingEvents<'a> {
    fn finish(&mut self) -> Option<Result<Notification>> {
        self.is_done = true;
        let invalid_ids = self.stream.error_subscription_ids();
        if invalid_ids.is_empty() {
            None
        } else {
            Some(Err(Error::InvalidSubscription(invalid_ids)))
        }
    }
}

impl<'a> Iterator for StreamingEvents<'a> {
    type Item = Result<Notification>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_done {
            return None;
        }

        if let Some(max) = self.max_notifications {
            if self.count >= max {
                debug!("reached {} streamed notification(s), stopping", max);
                return self.finish();
            }
        }

        match self.stream.next() {
            Some(Ok(notification)) => {
                self.count += 1;
                trace!("streamed notification: {:#?}", notification);
                Some(Ok(notification))
            }
            Some(Err(err)) => {
                self.is_done = true;
                Some(Err(err.into()))
            }
            None => self.finish(),
        }
    }
}

impl Folder {
    /// Creates a pull subscription on the folder. No event type means
    /// all of them. The `timeout` is in minutes.
    pub fn subscribe_to_pull(
        &self,
        root: &Root,
        event_types: &[EventType],
        watermark: Option<&str>,
        timeout: u32,
    ) -> Result<Subscription> {
        self.require_id()?;
        into_single(self.collection(root).subscribe_to_pull(
            event_types_or_all(event_types),
            watermark,
            timeout,
        )?)
    }

    /// Creates a push subscription on the folder. No event type means
    /// all of them. The `status_frequency` is in minutes.
    pub fn subscribe_to_push(
        &self,
        root: &Root,
        callback_url: &str,
        event_types: &[EventType],
        watermark: Option<&str>,
        status_frequency: u32,
    ) -> Result<Subscription> {
        self.require_id()?;
        into_single(self.collection(root).subscribe_to_push(
            callback_url,
            event_types_or_all(event_types),
            watermark,
            status_frequency,
        )?)
    }

    /// Creates a streaming subscription on the folder. No event type
    /// means all of them.
    pub fn subscribe_to_streaming(&self, root: &Root, event_types: &[EventType]) -> Result<Subscription> {
        self.require_id()?;
        into_single(
            self.collection(root)
                .subscribe_to_streaming(event_types_or_all(event_types))?,
        )
    }

    pub fn unsubscribe(&self, root: &Root, subscription_id: &str) -> Result<()> {
        info!("cancelling subscription {}", subscription_id);
        Ok(root.service().unsubscribe(subscription_id)?)
    }

    /// Pulls the events of a subscription, starting from the given
    /// watermark.
    pub fn get_events<'a>(&self, root: &'a Root<'a>, subscription_id: &str, watermark: &str) -> Events<'a> {
        info!("pulling events of subscription {}", subscription_id);
        Events {
            service: root.service(),
            subscription_id: subscription_id.to_owned(),
            watermark: watermark.to_owned(),
            is_done: false,
        }
    }

    /// Streams the events of the given subscriptions. The server keeps
    /// the connection open for `connection_timeout` minutes.
    pub fn get_streaming_events<'a>(
        &self,
        root: &'a Root<'a>,
        subscription_ids: &[String],
        connection_timeout: u32,
        max_notifications_returned: Option<usize>,
    ) -> Result<StreamingEvents<'a>> {
        let request_timeout =
            Duration::from_secs(u64::from(connection_timeout) * 60) + STREAMING_GRACE_PERIOD;
        info!(
            "streaming events of subscription(s) {}",
            subscription_ids.join(", ")
        );
        debug!("streaming request timeout: {:?}", request_timeout);

        let stream =
            root.service()
                .get_streaming_events(subscription_ids, connection_timeout, request_timeout)?;

        Ok(StreamingEvents {
            stream,
            max_notifications: max_notifications_returned.filter(|max| *max > 0),
            count: 0,
            is_done: false,
        })
    }
}
