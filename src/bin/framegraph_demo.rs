//! Frame graph demo.
//!
//! Assembles a small deferred pipeline with a two-stage bloom and runs it for
//! a fixed number of frames, printing the timing report at the end.
//!
//! ```text
//! begin_frame ─► depth_prepass ─► gbuffer ─► lighting ─► [bloom] ─► [tonemap]
//! ```

use std::time::Duration;

use clap::Parser;
use framegraph::profiling::{frame_mark, profile_plot};
use framegraph::{
    ExecuteContext, Extent, FrameClock, FrameScheduler, GraphResult, Node, NodeId, Process,
    SchedulerConfig, WorkUnit,
};

/// Frame graph demo arguments.
#[derive(Parser, Debug)]
#[command(
    name = "framegraph_demo",
    about = "Runs a sample frame graph",
    long_about = "Builds a depth, gbuffer, lighting, bloom and tonemap pipeline on top of \
                  the framegraph scheduler and executes it for a number of frames.\n\n\
                  Set RUST_LOG=debug to see topology and resize events."
)]
struct Args {
    /// Number of frames to execute.
    #[arg(long, default_value = "3")]
    frames: u64,

    /// Initial surface width in pixels.
    #[arg(long, default_value = "1280")]
    width: u32,

    /// Initial surface height in pixels.
    #[arg(long, default_value = "720")]
    height: u32,

    /// Resize the surface to double size before this frame.
    #[arg(long)]
    resize_at: Option<u64>,

    /// Disable the bloom process (its passes still run and return early).
    #[arg(long)]
    disable_bloom: bool,

    /// Log the timing report after every frame.
    #[arg(long)]
    verbose: bool,
}

/// Simulated render pass owning one size-dependent target.
struct Pass {
    cost: Duration,
    target: Extent,
    scale: f32,
}

impl Pass {
    fn new(cost_micros: u64, extent: Extent, scale: f32) -> Self {
        Self {
            cost: Duration::from_micros(cost_micros),
            target: extent.scaled(scale),
            scale,
        }
    }
}

impl WorkUnit for Pass {
    fn execute(&mut self, ctx: &ExecuteContext<'_>) {
        if !ctx.is_enabled() {
            return;
        }
        std::thread::sleep(self.cost);
        log::trace!("{} wrote {}", ctx.name(), self.target);
    }

    fn resize(&mut self, extent: Extent) {
        self.target = extent.scaled(self.scale);
    }
}

/// Downsample then upsample, sharing a half-resolution scratch target.
struct Bloom {
    nodes: Vec<NodeId>,
    scratch: Extent,
}

impl Process for Bloom {
    fn name(&self) -> &str {
        "bloom"
    }

    fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    fn entry(&self) -> NodeId {
        self.nodes[0]
    }

    fn exit(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    fn resize_resources(&mut self, extent: Extent) {
        self.scratch = extent.scaled(0.5);
        log::debug!("bloom scratch target is now {}", self.scratch);
    }
}

fn build(scheduler: &mut FrameScheduler, extent: Extent) -> GraphResult<()> {
    let root = scheduler.root();
    let depth = scheduler.add_node(Node::new("depth_prepass", Pass::new(150, extent, 1.0)));
    let gbuffer = scheduler.add_node(Node::new("gbuffer", Pass::new(400, extent, 1.0)));
    let lighting = scheduler.add_node(Node::new("lighting", Pass::new(300, extent, 1.0)));
    scheduler.add_parents(depth, &[root])?;
    scheduler.add_children(depth, &[gbuffer])?;
    scheduler.add_children(gbuffer, &[lighting])?;

    let down = scheduler.add_node(Node::new("bloom_downsample", Pass::new(80, extent, 0.5)));
    let up = scheduler.add_node(Node::new("bloom_upsample", Pass::new(80, extent, 1.0)));
    scheduler.add_children(down, &[up])?;
    let bloom = scheduler.add_process(Bloom {
        nodes: vec![down, up],
        scratch: extent.scaled(0.5),
    })?;

    let tonemap = scheduler.add_single_process(Node::new("tonemap", Pass::new(60, extent, 1.0)));

    scheduler.connect(lighting, bloom)?;
    scheduler.connect(bloom, tonemap)?;
    Ok(())
}

fn main() -> GraphResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting framegraph demo");
    framegraph::init();

    let extent = Extent::new(args.width, args.height);
    let config = SchedulerConfig {
        log_timings: args.verbose,
        ..Default::default()
    };
    let mut scheduler = FrameScheduler::with_config(
        Node::from_fn("begin_frame", |ctx| {
            if let Some(frame) = ctx.frame() {
                log::debug!("frame {} at {}", frame.frame_index, frame.extent);
            }
        }),
        config,
    );
    build(&mut scheduler, extent)?;

    if args.disable_bloom {
        let bloom = scheduler
            .processes()
            .find(|(_, process)| process.name() == "bloom")
            .map(|(id, _)| id);
        if let Some(bloom) = bloom {
            scheduler.process_mut(bloom)?.set_state(false);
        }
    }

    if !scheduler.is_valid() {
        log::warn!("frame graph reports invalid nodes");
    }

    let mut clock = FrameClock::new(extent);
    for frame in 0..args.frames {
        if args.resize_at == Some(frame) {
            let doubled = clock.extent().scaled(2.0);
            clock.set_extent(doubled);
            scheduler.resize(doubled);
        }

        scheduler.execute(&clock.tick());
        profile_plot!(
            "frame_graph_ms",
            scheduler.timing_report().total().as_secs_f64() * 1000.0
        );
        frame_mark!();
    }

    println!("{}", scheduler.timing_report());
    Ok(())
}
