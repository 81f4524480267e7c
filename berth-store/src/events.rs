#[cfg(feature = "kafka")]
mod kafka {
    use async_trait::async_trait;
    use berth_core::events::EventPublisher;
    use rdkafka::config::ClientConfig;
    use rdkafka::producer::{FutureProducer, FutureRecord};
    use rdkafka::util::Timeout;
    use std::time::Duration;
    use tracing::{error, info};

    /// Publishes booking events to Kafka, keyed by PNR so one booking's events stay ordered.
    #[derive(Clone)]
    pub struct KafkaEventProducer {
        producer: FutureProducer,
    }

    impl KafkaEventProducer {
        pub fn new(brokers: &str) -> Result<Self, rdkafka::error::KafkaError> {
            let producer: FutureProducer = ClientConfig::new()
                .set("bootstrap.servers", brokers)
                .set("message.timeout.ms", "5000")
                .create()?;

            Ok(Self { producer })
        }
    }

    #[async_trait]
    impl EventPublisher for KafkaEventProducer {
        async fn publish(
            &self,
            topic: &str,
            key: &str,
            payload: &str,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            let record = FutureRecord::to(topic).key(key).payload(payload);

            match self.producer.send(record, Timeout::After(Duration::from_secs(0))).await {
                Ok(delivery) => {
                    info!(
                        topic,
                        key,
                        partition = delivery.partition,
                        offset = delivery.offset,
                        "Event delivered"
                    );
                    Ok(())
                }
                Err((e, _msg)) => {
                    error!(topic, error = %e, "Failed to deliver event");
                    Err(Box::new(e))
                }
            }
        }
    }
}

#[cfg(feature = "kafka")]
pub use kafka::KafkaEventProducer;
