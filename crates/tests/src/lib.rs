//! # Integration Tests
//!
//! End-to-end runs of the node pipeline without a live transform source:
//! a recorded feed fills the buffer, the sampler ticks on paused time and
//! the dispatcher fans samples out to sinks.

#[cfg(test)]
mod config_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::SinkType;
    use dispatcher::create_dispatcher;

    #[tokio::test]
    async fn test_config_builds_dispatcher() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("twist.jsonl");
        let text = format!(
            r#"
[params]
rate = 5.0

[[sinks]]
name = "console"
sink_type = "log"

[[sinks]]
name = "recording"
sink_type = "file"
params = {{ path = "{}", append = "false" }}
"#,
            out.display()
        );

        let config = ConfigLoader::load_from_str(&text, ConfigFormat::Toml).unwrap();
        assert_eq!(config.params.rate, 5.0);
        assert_eq!(config.sinks[1].sink_type, SinkType::File);

        let dispatcher = create_dispatcher(config.sinks).await.unwrap();
        assert_eq!(dispatcher.sink_count(), 2);
        dispatcher.shutdown().await;
        assert!(out.exists());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use contracts::{
        ContractError, FramePair, SinkConfig, SinkType, Transform, TransformStamped, TwistSink,
        TwistStamped, Vector3,
    };
    use dispatcher::{create_dispatcher, Dispatcher, SinkHandle};
    use sampler::{shutdown_channel, SamplerConfig, TokioClock, VelocitySampler};
    use tf_buffer::{SharedTransformBuffer, TransformFeed};
    use tokio::io::BufReader;

    /// Keeps every written sample for inspection
    #[derive(Clone, Default)]
    struct CollectingSink {
        samples: Arc<Mutex<Vec<TwistStamped>>>,
    }

    impl TwistSink for CollectingSink {
        fn name(&self) -> &str {
            "collect"
        }

        async fn write(&mut self, sample: &TwistStamped) -> Result<(), ContractError> {
            self.samples.lock().unwrap().push(sample.clone());
            Ok(())
        }

        async fn flush(&mut self) -> Result<(), ContractError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    fn frames() -> FramePair {
        FramePair::new("odom", "base_link").unwrap()
    }

    /// base_link moving along odom x at 0.5 m/s, sampled every 0.2s
    fn moving_base_feed() -> String {
        (0..=10)
            .map(|i| {
                let stamp = 20.0 + i as f64 * 0.2;
                let tf = TransformStamped::new(
                    "odom",
                    "base_link",
                    stamp,
                    Transform {
                        translation: Vector3::new(0.5 * (stamp - 20.0), 0.0, 0.0),
                        ..Transform::IDENTITY
                    },
                );
                serde_json::to_string(&tf).unwrap() + "\n"
            })
            .collect()
    }

    async fn replay(buffer: &SharedTransformBuffer, text: String) {
        let reader = Box::new(BufReader::new(Cursor::new(text.into_bytes())));
        let stats = TransformFeed::from_reader(reader, buffer.clone(), false)
            .run()
            .await;
        assert_eq!(stats.malformed, 0);
    }

    fn collecting_dispatcher() -> (Dispatcher, CollectingSink) {
        let sink = CollectingSink::default();
        let dispatcher = Dispatcher::with_handles(vec![SinkHandle::spawn(sink.clone(), 64)]);
        (dispatcher, sink)
    }

    /// Feed -> buffer -> sampler -> dispatcher -> sink
    #[tokio::test(start_paused = true)]
    async fn test_e2e_moving_frame() {
        let buffer = SharedTransformBuffer::default();
        replay(&buffer, moving_base_feed()).await;

        let (dispatcher, sink) = collecting_dispatcher();
        let mut sampler = VelocitySampler::with_clock(
            SamplerConfig::new(frames(), 10.0),
            buffer,
            dispatcher,
            TokioClock::starting_at(100.0),
        );

        let (trigger, signal) = shutdown_channel();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(550)).await;
            trigger.trigger();
        });

        let stats = sampler.run(signal).await;
        let snapshots = sampler.into_sink().shutdown().await;

        assert!(stats.initially_available);
        assert_eq!(stats.ticks(), 6);
        assert_eq!(stats.published(), 6);
        assert_eq!(snapshots[0].1.written, 6);

        let samples = sink.samples.lock().unwrap();
        assert_eq!(samples.len(), 6);
        for (i, sample) in samples.iter().enumerate() {
            assert_eq!(sample.header.frame_id, "odom");
            assert!((sample.header.stamp - (100.0 + 0.1 * i as f64)).abs() < 1e-6);
            assert!((sample.twist.linear.x - 0.5).abs() < 1e-9);
            assert!(sample.twist.linear.y.abs() < 1e-9);
            assert!(sample.twist.angular.z.abs() < 1e-9);
        }
    }

    /// Frames that never connect: every tick fails, nothing is published
    #[tokio::test(start_paused = true)]
    async fn test_e2e_unavailable_transform_keeps_running() {
        let buffer = SharedTransformBuffer::default();
        buffer
            .insert(TransformStamped::new("map", "odom", 5.0, Transform::IDENTITY))
            .unwrap();

        let (dispatcher, sink) = collecting_dispatcher();
        let mut sampler = VelocitySampler::with_clock(
            SamplerConfig::new(frames(), 4.0),
            buffer,
            dispatcher,
            TokioClock::starting_at(0.0),
        );

        let (trigger, signal) = shutdown_channel();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1600)).await;
            trigger.trigger();
        });

        let stats = sampler.run(signal).await;
        sampler.into_sink().shutdown().await;

        assert!(!stats.initially_available);
        // initial wait ends at 1.0s, ticks at 1.0, 1.25 and 1.5
        assert_eq!(stats.ticks(), 3);
        assert_eq!(stats.failed(), 3);
        assert_eq!(stats.published(), 0);
        assert!(sink.samples.lock().unwrap().is_empty());
    }

    /// Samples written through a configured file sink
    #[tokio::test]
    async fn test_e2e_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out").join("twist.jsonl");

        let buffer = SharedTransformBuffer::default();
        replay(&buffer, moving_base_feed()).await;

        let dispatcher = create_dispatcher(vec![SinkConfig {
            name: "recording".to_string(),
            sink_type: SinkType::File,
            queue_capacity: 16,
            params: [("path".to_string(), out.display().to_string())]
                .into_iter()
                .collect(),
        }])
        .await
        .unwrap();

        let mut sampler =
            VelocitySampler::new(SamplerConfig::new(frames(), 10.0), buffer, dispatcher);
        for _ in 0..3 {
            assert!(sampler.tick().await.is_published());
        }
        let snapshots = sampler.into_sink().shutdown().await;
        assert_eq!(snapshots[0].0, "recording");
        assert_eq!(snapshots[0].1.written, 3);

        let text = std::fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let sample: TwistStamped = serde_json::from_str(line).unwrap();
            assert_eq!(sample.header.frame_id, "odom");
            assert!((sample.twist.linear.x - 0.5).abs() < 1e-9);
        }
    }
}
