use chrono::{DateTime, Utc};
use uuid::Uuid;

use amora_shared::clients::rabbitmq::RabbitMQClient;
use amora_shared::types::event::{payloads, routing_keys, Event};

const SOURCE: &str = "amora-profile";

pub async fn publish_profile_created(rabbitmq: &RabbitMQClient, profile_id: Uuid, credential_id: Uuid) {
    let event = Event::new(
        SOURCE,
        routing_keys::PROFILE_CREATED,
        payloads::ProfileCreated {
            profile_id,
            credential_id,
        },
    )
    .with_profile(profile_id);

    if let Err(e) = rabbitmq.publish(routing_keys::PROFILE_CREATED, &event).await {
        tracing::error!(error = %e, "failed to publish profile.created event");
    }
}

pub async fn publish_profile_deleted(rabbitmq: &RabbitMQClient, profile_id: Uuid) {
    let event = Event::new(SOURCE, routing_keys::PROFILE_DELETED, payloads::ProfileDeleted { profile_id })
        .with_profile(profile_id);

    if let Err(e) = rabbitmq.publish(routing_keys::PROFILE_DELETED, &event).await {
        tracing::error!(error = %e, "failed to publish profile.deleted event");
    }
}

pub async fn publish_profile_suspended(rabbitmq: &RabbitMQClient, profile_id: Uuid, complaints_this_month: i64) {
    let event = Event::new(
        SOURCE,
        routing_keys::PROFILE_SUSPENDED,
        payloads::ProfileSuspended {
            profile_id,
            complaints_this_month,
        },
    )
    .with_profile(profile_id);

    if let Err(e) = rabbitmq.publish(routing_keys::PROFILE_SUSPENDED, &event).await {
        tracing::error!(error = %e, "failed to publish profile.suspended event");
    }
}

pub async fn publish_like_sent(rabbitmq: &RabbitMQClient, like_id: Uuid, liker_id: Uuid, liked_id: Uuid) {
    let event = Event::new(
        SOURCE,
        routing_keys::LIKE_SENT,
        payloads::LikeSent {
            like_id,
            liker_id,
            liked_id,
        },
    )
    .with_profile(liker_id);

    if let Err(e) = rabbitmq.publish(routing_keys::LIKE_SENT, &event).await {
        tracing::error!(error = %e, "failed to publish like.sent event");
    }
}

pub async fn publish_block_created(rabbitmq: &RabbitMQClient, blocker_id: Uuid, blocked_id: Uuid, mutual: bool) {
    let event = Event::new(
        SOURCE,
        routing_keys::BLOCK_CREATED,
        payloads::BlockCreated {
            blocker_id,
            blocked_id,
            mutual,
        },
    )
    .with_profile(blocker_id);

    if let Err(e) = rabbitmq.publish(routing_keys::BLOCK_CREATED, &event).await {
        tracing::error!(error = %e, "failed to publish block.created event");
    }
}

pub async fn publish_complaint_filed(
    rabbitmq: &RabbitMQClient,
    complaint_id: Uuid,
    complaining_id: Uuid,
    accused_id: Uuid,
    created_at: DateTime<Utc>,
) {
    let event = Event::new(
        SOURCE,
        routing_keys::COMPLAINT_FILED,
        payloads::ComplaintFiled {
            complaint_id,
            complaining_id,
            accused_id,
            created_at,
        },
    )
    .with_profile(complaining_id);

    if let Err(e) = rabbitmq.publish(routing_keys::COMPLAINT_FILED, &event).await {
        tracing::error!(error = %e, "failed to publish complaint.filed event");
    }
}
