//! Desktop simulation of the quadrature decoder fabric.
//!
//! Claims every hardware channel on a simulated register file, spins each
//! simulated encoder at its own speed, and prints channel status every
//! 200 ms of simulated time. Halfway through, channel 0 is disabled,
//! channel 1 is reset and channel 2 switches to 20 ms sampling.
//!
//! # Usage
//!
//! ```bash
//! # 2 seconds of simulated time, channels sampling every 200 ms
//! cargo run --bin fabric_sim
//!
//! # 5 seconds, starting at 20 ms sampling
//! cargo run --bin fabric_sim -- 5000 fast
//! ```

use anyhow::{bail, Context};
use fabric_quadrature::hal::{MockLines, MockRegisters};
use fabric_quadrature::{
    FabricConfig, QuadratureChannel, QuadratureError, QuadratureFabric, SampleRate, MAX_CHANNELS,
};

/// Simulation tick in milliseconds (matches the fast sample interval)
const TICK_MS: u32 = 20;

/// Status print interval in milliseconds
const REPORT_MS: u32 = 200;

/// Default simulated run time in milliseconds
const DEFAULT_RUN_MS: u32 = 2000;

type SimFabric = QuadratureFabric<MockRegisters, MockLines>;

/// Pulses per tick for each simulated encoder (sign = direction).
fn pulses_per_tick(index: u8) -> i32 {
    (index as i32 - 2) * 3
}

/// Per-channel bookkeeping for the simulated rate sampler.
#[derive(Default, Clone, Copy)]
struct Sampler {
    elapsed_ms: u32,
    pulses: i32,
}

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let run_ms: u32 = match args.next() {
        Some(s) => s.parse().with_context(|| format!("invalid run time '{}'", s))?,
        None => DEFAULT_RUN_MS,
    };
    let rate = match args.next() {
        Some(s) => match SampleRate::from_text(&s) {
            Some(rate) => rate,
            None => bail!("unknown sample rate '{}' (use fast/slow/20ms/200ms)", s),
        },
        None => SampleRate::Slow,
    };

    println!("[Sim] {} ms, {} ms sampling", run_ms, rate.interval_ms());

    let config = FabricConfig::default().with_sample_rate(rate);
    let fabric: SimFabric =
        QuadratureFabric::with_config(MockRegisters::new(), MockLines::new(), config);

    // =========================================================================
    // Claim channels
    // =========================================================================
    let mut channels = Vec::with_capacity(MAX_CHANNELS);
    for _ in 0..MAX_CHANNELS {
        let ch = fabric.claim().context("claiming quadrature channel")?;
        if let Some((a, b)) = ch.lines() {
            println!("[OK] Channel {} on lines {}/{}", ch.index().raw(), a, b);
        }
        channels.push(ch);
    }

    match fabric.claim() {
        Err(e @ QuadratureError::ResourceExhausted) => {
            println!("[OK] Channel {} refused: {}", MAX_CHANNELS, e)
        }
        Err(e) => bail!("unexpected claim error: {}", e),
        Ok(ch) => bail!("claimed a channel past the limit: {:?}", ch),
    }

    // =========================================================================
    // Main loop
    // =========================================================================
    let mut samplers = [Sampler::default(); MAX_CHANNELS];
    let mut now_ms = 0;
    let mut past_midpoint = false;
    while now_ms < run_ms {
        now_ms += TICK_MS;
        step(&fabric, &channels, &mut samplers);

        if !past_midpoint && now_ms >= run_ms / 2 {
            midpoint(&channels)?;
            past_midpoint = true;
        }

        if now_ms % REPORT_MS == 0 {
            report(now_ms, &channels)?;
        }
    }

    let writes = fabric.bus().control_writes.len();
    println!("[Sim] done, {} control writes", writes);
    Ok(())
}

/// Advance every simulated encoder by one tick and publish completed rates.
fn step(
    fabric: &SimFabric,
    channels: &[QuadratureChannel<'_, MockRegisters, MockLines>],
    samplers: &mut [Sampler],
) {
    let mut regs = fabric.bus_mut();
    for (ch, sampler) in channels.iter().zip(samplers.iter_mut()) {
        let index = ch.index().raw();
        let delta = pulses_per_tick(index);
        let sim = *regs.channel(index);
        regs.pulse(index, delta);

        if sim.enabled {
            sampler.pulses += delta;
        }
        sampler.elapsed_ms += TICK_MS;
        if sampler.elapsed_ms >= sim.sample_rate.interval_ms() {
            regs.set_rate(index, sampler.pulses as i16);
            *sampler = Sampler::default();
        }
    }
}

fn midpoint(channels: &[QuadratureChannel<'_, MockRegisters, MockLines>]) -> anyhow::Result<()> {
    println!("[Sim] disabling ch0, resetting ch1, ch2 -> 20 ms");
    channels[0].disable()?;
    channels[1].reset()?;
    channels[2].set_sample_rate(SampleRate::Fast)?;
    Ok(())
}

fn report(
    now_ms: u32,
    channels: &[QuadratureChannel<'_, MockRegisters, MockLines>],
) -> anyhow::Result<()> {
    println!("[{:>5} ms]", now_ms);
    for ch in channels {
        let status = ch.status()?;
        println!(
            "  ch{} {:<3} {:>4} count={:>7} rate={:>5} ({:>6} p/s, {})",
            status.index.raw(),
            if status.enabled { "on" } else { "off" },
            status.sample_rate.as_str(),
            status.count,
            status.rate,
            status.pulses_per_second(),
            status.direction().as_str(),
        );
    }
    Ok(())
}
