//! LogSink - logs a one-line summary of each sample via tracing

use contracts::{ContractError, TwistSink, TwistStamped};
use tracing::{info, instrument};

pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TwistSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_sink_write", skip(self, sample), fields(sink = %self.name))]
    async fn write(&mut self, sample: &TwistStamped) -> Result<(), ContractError> {
        let linear = &sample.twist.linear;
        let angular = &sample.twist.angular;
        info!(
            frame_id = %sample.header.frame_id,
            stamp = sample.header.stamp,
            vx = linear.x,
            vy = linear.y,
            vz = linear.z,
            wx = angular.x,
            wy = angular.y,
            wz = angular.z,
            speed = linear.norm(),
            "Twist sample"
        );
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
