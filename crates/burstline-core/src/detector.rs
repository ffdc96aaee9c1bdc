//! Pipeline Orchestrator
//!
//! Owns the run loop of the extraction pipeline. Construction validates the
//! configuration and derives a [`ChannelPlan`]; the run loop then pulls
//! chunks from the sample source, has the burst tagging stage annotate each
//! chunk with events, routes chunk and events through the planned topology
//! and hands every completed burst to the collector.
//!
//! ```text
//!                      ┌─► burst assembler ─────────────────┐
//! source ──► tagger ───┤                                    ├──► collector
//!  (chunks)  (events)  └─► channel bank ──► translator ─────┘
//! ```
//!
//! The single-channel path runs one [`BurstAssembler`] over the full
//! passband. The channelized path hands chunk and events to an external
//! [`ChannelBank`] (the polyphase channelizer plus its per-channel
//! extraction stages) and converts its completion events through the
//! [`ChannelTranslator`]. The source, the tagger, the bank and the
//! collector all sit behind traits; this crate orchestrates, it does not
//! perform spectral detection or filtering itself.
//!
//! ## Example
//!
//! ```rust
//! use burstline_core::burst_events::BurstEvent;
//! use burstline_core::channel_translator::ExtractedBurst;
//! use burstline_core::config::DetectorConfig;
//! use burstline_core::detector::{BurstCollector, BurstTagging, Detector, SampleSource};
//! use burstline_core::types::{DetectorResult, IQSample};
//! use num_complex::Complex64;
//!
//! struct OneShotSource(Option<Vec<IQSample>>);
//! impl SampleSource for OneShotSource {
//!     fn next_chunk(&mut self) -> DetectorResult<Option<Vec<IQSample>>> {
//!         Ok(self.0.take())
//!     }
//! }
//!
//! struct FixedTagger(Vec<BurstEvent>);
//! impl BurstTagging for FixedTagger {
//!     fn tag_chunk(&mut self, _samples: &[IQSample]) -> Vec<BurstEvent> {
//!         std::mem::take(&mut self.0)
//!     }
//! }
//!
//! struct Sink(Vec<ExtractedBurst>);
//! impl BurstCollector for Sink {
//!     fn collect(&mut self, burst: ExtractedBurst) {
//!         self.0.push(burst);
//!     }
//! }
//!
//! let mut detector = Detector::new(DetectorConfig::new(1_000_000)).unwrap();
//! let mut source = OneShotSource(Some(vec![Complex64::new(1.0, 0.0); 1000]));
//! let mut tagger = FixedTagger(vec![
//!     BurstEvent::Started {
//!         burst_id: 1,
//!         position: 100,
//!         relative_frequency: 0.1,
//!         magnitude: 11.0,
//!     },
//!     BurstEvent::Ended { burst_id: 1, position: 899 },
//! ]);
//! let mut sink = Sink(Vec::new());
//!
//! let stats = detector.run(&mut source, &mut tagger, None, &mut sink).unwrap();
//! assert_eq!(stats.bursts, 1);
//! assert_eq!(sink.0[0].samples.len(), 800);
//! assert_eq!(sink.0[0].time_offset, 1e-4);
//! ```

use tracing::{debug, info, warn};

use crate::burst_assembler::{BurstAssembler, BurstRecord};
use crate::burst_events::BurstEvent;
use crate::channel_plan::{plan, ChannelPlan};
use crate::channel_translator::{ChannelBurst, ChannelTranslator, ExtractedBurst};
use crate::config::DetectorConfig;
use crate::types::{DetectorError, DetectorResult, IQSample};

/// Pull interface over the external sample stream.
pub trait SampleSource {
    /// Next chunk of baseband samples, or `None` once the stream is
    /// exhausted. Chunk sizes are the source's choice and may vary from
    /// call to call.
    fn next_chunk(&mut self) -> DetectorResult<Option<Vec<IQSample>>>;
}

/// Interface over the external burst detection stage.
pub trait BurstTagging {
    /// Analyze one chunk and return the events whose positions fall inside
    /// it. The tagger tracks stream positions itself; event positions are
    /// absolute.
    fn tag_chunk(&mut self, samples: &[IQSample]) -> Vec<BurstEvent>;
}

/// Interface over the external channelizer together with its per-channel
/// extraction stages.
pub trait ChannelBank {
    /// Feed one wideband chunk and its events; returns whatever completion
    /// events became ready.
    fn process_chunk(&mut self, samples: &[IQSample], events: &[BurstEvent])
        -> Vec<ChannelBurst>;

    /// Signal end of input; returns the completion events still in flight.
    fn finish(&mut self) -> Vec<ChannelBurst> {
        Vec::new()
    }
}

/// Receives completed burst records. Persistence and naming live behind
/// this seam.
pub trait BurstCollector {
    fn collect(&mut self, burst: ExtractedBurst);
}

/// Pipeline lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Plan derived, stream not yet started.
    Configuring,
    /// Consuming the stream.
    Running,
    /// Stream ended; no further input is accepted.
    Finished,
}

/// Counters reported after a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Chunks pulled from the source.
    pub chunks: u64,
    /// Samples pulled from the source.
    pub samples: u64,
    /// Burst records delivered to the collector.
    pub bursts: u64,
}

/// The pipeline orchestrator.
#[derive(Debug, Clone)]
pub struct Detector {
    config: DetectorConfig,
    plan: ChannelPlan,
    state: DetectorState,
}

impl Detector {
    /// Validate the configuration and derive the processing plan.
    ///
    /// Every planner failure surfaces here, before any stream input is
    /// consumed, so an infeasible pipeline never starts.
    pub fn new(config: DetectorConfig) -> DetectorResult<Self> {
        config.validate()?;
        let plan = plan(config.sample_rate, config.decimation, config.signal_width_hz)?;
        if config.verbose {
            info!(
                "detector configured: {} (threshold {:.1} dB)",
                plan, config.detection_threshold_db
            );
        } else {
            debug!(
                "detector configured: {} (threshold {:.1} dB)",
                plan, config.detection_threshold_db
            );
        }
        Ok(Self {
            config,
            plan,
            state: DetectorState::Configuring,
        })
    }

    /// The derived processing plan.
    pub fn plan(&self) -> &ChannelPlan {
        &self.plan
    }

    /// The configuration this detector was built from.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Drive the pipeline until the source reports end of stream.
    ///
    /// The topology follows the plan: without a channelizer section the
    /// whole passband runs through one reassembly engine; with one, every
    /// chunk goes to `channel_bank` and its completion events come back
    /// through the translator. Running a channelized plan without a bank
    /// is an error, as is calling `run` again after the stream ended. A
    /// bank supplied alongside a single-channel plan is ignored with a
    /// warning.
    ///
    /// Bursts still open when the stream ends are delivered as truncated
    /// records rather than silently dropped.
    pub fn run(
        &mut self,
        source: &mut dyn SampleSource,
        tagger: &mut dyn BurstTagging,
        mut channel_bank: Option<&mut dyn ChannelBank>,
        collector: &mut dyn BurstCollector,
    ) -> DetectorResult<RunStats> {
        if self.state == DetectorState::Finished {
            return Err(DetectorError::AlreadyFinished);
        }
        if self.plan.is_multichannel() && channel_bank.is_none() {
            return Err(DetectorError::MissingChannelizer);
        }
        if !self.plan.is_multichannel() && channel_bank.is_some() {
            warn!("plan is single-channel, ignoring the supplied channel bank");
            channel_bank = None;
        }
        self.state = DetectorState::Running;

        let translator = self.plan.channelizer.as_ref().map(|ch| {
            ChannelTranslator::new(ch.channel_count, self.plan.output_sample_rate as f64)
        });
        // Single-channel path: one engine over the full passband.
        let mut assembler = BurstAssembler::new(0.0, 1.0);
        let mut stats = RunStats::default();

        while let Some(chunk) = source.next_chunk()? {
            let events = tagger.tag_chunk(&chunk);
            stats.chunks += 1;
            stats.samples += chunk.len() as u64;
            if !events.is_empty() {
                debug!("chunk {}: {} event(s)", stats.chunks, events.len());
            }

            match (&mut channel_bank, &translator) {
                (Some(bank), Some(translator)) => {
                    for event in bank.process_chunk(&chunk, &events) {
                        if let Some(burst) = translator.translate(event) {
                            collector.collect(burst);
                            stats.bursts += 1;
                        }
                    }
                }
                _ => {
                    for record in assembler.process_chunk(&chunk, &events) {
                        collector.collect(self.finalize(record));
                        stats.bursts += 1;
                    }
                }
            }
        }

        // End of stream: hand over whatever is still in flight.
        match (&mut channel_bank, &translator) {
            (Some(bank), Some(translator)) => {
                for event in bank.finish() {
                    if let Some(burst) = translator.translate(event) {
                        collector.collect(burst);
                        stats.bursts += 1;
                    }
                }
            }
            _ => {
                let leftover = assembler.flush();
                if !leftover.is_empty() {
                    warn!(
                        "stream ended with {} burst(s) still open, emitting truncated records",
                        leftover.len()
                    );
                }
                for record in leftover {
                    collector.collect(self.finalize(record));
                    stats.bursts += 1;
                }
            }
        }

        self.state = DetectorState::Finished;
        info!(
            "stream finished: {} chunks, {} samples, {} bursts",
            stats.chunks, stats.samples, stats.bursts
        );
        Ok(stats)
    }

    /// Convert an engine record into collector units: seconds for the
    /// start time, Hz within the wideband stream for the frequency. The
    /// full-band engine is centered on DC, so the center offset is zero.
    fn finalize(&self, record: BurstRecord) -> ExtractedBurst {
        ExtractedBurst {
            time_offset: record.start_position as f64 / self.plan.output_sample_rate as f64,
            magnitude: record.magnitude,
            frequency_hz: record.relative_frequency * self.plan.input_sample_rate as f64,
            center_hz: 0.0,
            samples: record.samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use std::collections::VecDeque;

    struct VecSource {
        chunks: VecDeque<Vec<IQSample>>,
    }

    impl VecSource {
        fn new(chunks: Vec<Vec<IQSample>>) -> Self {
            Self {
                chunks: chunks.into(),
            }
        }
    }

    impl SampleSource for VecSource {
        fn next_chunk(&mut self) -> DetectorResult<Option<Vec<IQSample>>> {
            Ok(self.chunks.pop_front())
        }
    }

    /// Replays a scripted event schedule, delivering each event with the
    /// chunk its position falls into.
    struct ScriptedTagger {
        events: Vec<BurstEvent>,
        consumed: u64,
    }

    impl ScriptedTagger {
        fn new(events: Vec<BurstEvent>) -> Self {
            Self {
                events,
                consumed: 0,
            }
        }
    }

    impl BurstTagging for ScriptedTagger {
        fn tag_chunk(&mut self, samples: &[IQSample]) -> Vec<BurstEvent> {
            let start = self.consumed;
            let end = start + samples.len() as u64;
            self.consumed = end;
            let (hit, rest) = self
                .events
                .drain(..)
                .partition(|e| e.position() >= start && e.position() < end);
            self.events = rest;
            hit
        }
    }

    #[derive(Default)]
    struct MemoryCollector {
        bursts: Vec<ExtractedBurst>,
    }

    impl BurstCollector for MemoryCollector {
        fn collect(&mut self, burst: ExtractedBurst) {
            self.bursts.push(burst);
        }
    }

    /// Emits one canned completion event per chunk fed to it, plus one
    /// more at finish.
    struct ScriptedBank {
        per_chunk: VecDeque<ChannelBurst>,
        at_finish: Vec<ChannelBurst>,
        chunks_seen: usize,
    }

    impl ChannelBank for ScriptedBank {
        fn process_chunk(
            &mut self,
            _samples: &[IQSample],
            _events: &[BurstEvent],
        ) -> Vec<ChannelBurst> {
            self.chunks_seen += 1;
            self.per_chunk.pop_front().into_iter().collect()
        }

        fn finish(&mut self) -> Vec<ChannelBurst> {
            std::mem::take(&mut self.at_finish)
        }
    }

    fn ramp(range: std::ops::Range<u64>) -> Vec<IQSample> {
        range.map(|i| Complex64::new(i as f64, 0.0)).collect()
    }

    fn started(burst_id: u64, position: u64, relative_frequency: f64) -> BurstEvent {
        BurstEvent::Started {
            burst_id,
            position,
            relative_frequency,
            magnitude: 12.0,
        }
    }

    fn ended(burst_id: u64, position: u64) -> BurstEvent {
        BurstEvent::Ended { burst_id, position }
    }

    #[test]
    fn test_single_channel_run_collects_bursts() {
        let mut detector = Detector::new(DetectorConfig::new(1_000_000)).unwrap();
        assert_eq!(detector.state(), DetectorState::Configuring);

        let mut source = VecSource::new(vec![ramp(0..4000), ramp(4000..8000)]);
        let mut tagger =
            ScriptedTagger::new(vec![started(1, 1000, 0.1), ended(1, 5999)]);
        let mut sink = MemoryCollector::default();

        let stats = detector
            .run(&mut source, &mut tagger, None, &mut sink)
            .unwrap();
        assert_eq!(
            stats,
            RunStats {
                chunks: 2,
                samples: 8000,
                bursts: 1
            }
        );
        assert_eq!(detector.state(), DetectorState::Finished);

        let burst = &sink.bursts[0];
        assert_eq!(burst.samples.len(), 5000);
        assert_eq!(burst.samples[0], Complex64::new(1000.0, 0.0));
        // Start time and frequency are scaled into seconds and Hz.
        assert!((burst.time_offset - 1e-3).abs() < 1e-12);
        assert!((burst.frequency_hz - 100_000.0).abs() < 1e-6);
        assert_eq!(burst.center_hz, 0.0);
    }

    #[test]
    fn test_detector_debug_and_clone() {
        let detector = Detector::new(DetectorConfig::new(1_000_000)).unwrap();
        let copy = detector.clone();
        assert_eq!(copy.state(), DetectorState::Configuring);
        assert_eq!(copy.plan(), detector.plan());
        let dump = format!("{:?}", detector);
        assert!(dump.contains("Configuring"), "debug output was: {dump}");
    }

    #[test]
    fn test_single_channel_plan_ignores_supplied_bank() {
        let mut detector = Detector::new(DetectorConfig::new(1_000_000)).unwrap();
        let mut source = VecSource::new(vec![ramp(0..1000)]);
        let mut tagger = ScriptedTagger::new(vec![started(1, 100, 0.1), ended(1, 499)]);
        let mut sink = MemoryCollector::default();
        // A bank wired in by mistake; if consulted it would emit this.
        let mut bank = ScriptedBank {
            per_chunk: VecDeque::from(vec![ChannelBurst {
                channel_index: 0,
                relative_frequency: 0.0,
                magnitude: 5.0,
                start_position: 0,
                samples: vec![Complex64::new(9.0, 9.0); 4],
            }]),
            at_finish: Vec::new(),
            chunks_seen: 0,
        };

        let stats = detector
            .run(&mut source, &mut tagger, Some(&mut bank), &mut sink)
            .unwrap();
        assert_eq!(bank.chunks_seen, 0, "single-channel topology bypasses the bank");
        assert_eq!(stats.bursts, 1);
        assert_eq!(sink.bursts[0].samples.len(), 400, "record came from the assembler");
    }

    #[test]
    fn test_run_twice_is_rejected() {
        let mut detector = Detector::new(DetectorConfig::new(1_000_000)).unwrap();
        let mut tagger = ScriptedTagger::new(Vec::new());
        let mut sink = MemoryCollector::default();
        detector
            .run(
                &mut VecSource::new(vec![ramp(0..100)]),
                &mut tagger,
                None,
                &mut sink,
            )
            .unwrap();
        let err = detector
            .run(
                &mut VecSource::new(vec![ramp(0..100)]),
                &mut tagger,
                None,
                &mut sink,
            )
            .unwrap_err();
        assert_eq!(err, DetectorError::AlreadyFinished);
    }

    #[test]
    fn test_open_bursts_are_flushed_at_end_of_stream() {
        let mut detector = Detector::new(DetectorConfig::new(1_000_000)).unwrap();
        let mut source = VecSource::new(vec![ramp(0..2000)]);
        // Started but never ended.
        let mut tagger = ScriptedTagger::new(vec![started(1, 500, -0.05)]);
        let mut sink = MemoryCollector::default();

        let stats = detector
            .run(&mut source, &mut tagger, None, &mut sink)
            .unwrap();
        assert_eq!(stats.bursts, 1);
        let burst = &sink.bursts[0];
        assert_eq!(burst.samples.len(), 1500, "truncated at end of stream");
        assert!((burst.frequency_hz + 50_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_source_error_propagates() {
        struct FailingSource;
        impl SampleSource for FailingSource {
            fn next_chunk(&mut self) -> DetectorResult<Option<Vec<IQSample>>> {
                Err(DetectorError::Source("device unplugged".into()))
            }
        }

        let mut detector = Detector::new(DetectorConfig::new(1_000_000)).unwrap();
        let mut tagger = ScriptedTagger::new(Vec::new());
        let mut sink = MemoryCollector::default();
        let err = detector
            .run(&mut FailingSource, &mut tagger, None, &mut sink)
            .unwrap_err();
        assert_eq!(err, DetectorError::Source("device unplugged".into()));
    }

    #[test]
    fn test_multichannel_plan_requires_a_bank() {
        let config = DetectorConfig::new(2_000_000).with_decimation(4);
        let mut detector = Detector::new(config).unwrap();
        let mut source = VecSource::new(vec![ramp(0..100)]);
        let mut tagger = ScriptedTagger::new(Vec::new());
        let mut sink = MemoryCollector::default();
        let err = detector
            .run(&mut source, &mut tagger, None, &mut sink)
            .unwrap_err();
        assert_eq!(err, DetectorError::MissingChannelizer);
        // The failed call consumed nothing; a bank makes it runnable.
        let mut bank = ScriptedBank {
            per_chunk: VecDeque::new(),
            at_finish: Vec::new(),
            chunks_seen: 0,
        };
        let stats = detector
            .run(&mut source, &mut tagger, Some(&mut bank), &mut sink)
            .unwrap();
        assert_eq!(stats.chunks, 1);
        assert_eq!(bank.chunks_seen, 1);
    }

    #[test]
    fn test_multichannel_run_translates_completion_events() {
        let config = DetectorConfig::new(2_000_000).with_decimation(4);
        let mut detector = Detector::new(config).unwrap();
        assert_eq!(detector.plan().output_sample_rate, 500_000);

        let event_in_chunk = ChannelBurst {
            channel_index: 1,
            relative_frequency: 0.05,
            magnitude: 10.0,
            start_position: 250_000,
            samples: vec![Complex64::new(0.5, 0.5); 64],
        };
        let event_at_finish = ChannelBurst {
            channel_index: 4,
            relative_frequency: 0.0,
            magnitude: 8.0,
            start_position: 500_000,
            samples: vec![Complex64::new(1.0, 0.0); 32],
        };
        let mut bank = ScriptedBank {
            per_chunk: VecDeque::from(vec![event_in_chunk]),
            at_finish: vec![event_at_finish],
            chunks_seen: 0,
        };

        let mut source = VecSource::new(vec![ramp(0..1000), ramp(1000..2000)]);
        let mut tagger = ScriptedTagger::new(Vec::new());
        let mut sink = MemoryCollector::default();
        let stats = detector
            .run(&mut source, &mut tagger, Some(&mut bank), &mut sink)
            .unwrap();

        assert_eq!(stats.bursts, 2);
        assert_eq!(bank.chunks_seen, 2);
        // Channel 1 of 5 sits at +0.2 of the wideband rate.
        let first = &sink.bursts[0];
        assert!((first.time_offset - 0.5).abs() < 1e-12);
        assert!((first.frequency_hz - 125_000.0).abs() < 1e-6);
        assert!((first.center_hz - 100_000.0).abs() < 1e-6);
        // Channel 4 sits at -0.2; the finish event arrives last.
        let second = &sink.bursts[1];
        assert!((second.time_offset - 1.0).abs() < 1e-12);
        assert!((second.frequency_hz + 100_000.0).abs() < 1e-6);
        assert_eq!(second.samples.len(), 32);
    }

    #[test]
    fn test_infeasible_configuration_never_starts() {
        let config = DetectorConfig::new(2_000_000)
            .with_decimation(4)
            .with_signal_width_hz(150_000.0);
        let err = Detector::new(config).unwrap_err();
        assert!(matches!(err, DetectorError::InfeasibleFilter { .. }));

        let config = DetectorConfig::new(1_000_000).with_decimation(3);
        let err = Detector::new(config).unwrap_err();
        assert_eq!(err, DetectorError::InvalidDecimation(3));
    }
}
