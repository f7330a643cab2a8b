use std::process::ExitCode;

use rand::SeedableRng;

use rayscene::{
    cli::{Arguments, Parser},
    context::SceneContext,
    error::{Diagnostics, SceneResult},
    probe::Probe,
    scenes,
    stats::GeomStats,
};

fn run(cli_args: &Arguments, diagnostics: &Diagnostics) -> SceneResult<()> {
    // set up enviroment
    let seed = cli_args.seed.unwrap_or_else(|| {
        if cfg!(debug_assertions) {
            // if debugging, use deterministic seed
            0
        } else {
            // otherwise real psuedo-randomness
            rand::random()
        }
    });
    let mut rng = rand::rngs::SmallRng::seed_from_u64(seed);

    // Get scene
    let objects = scenes::get_scene(cli_args.scene, cli_args.texture.as_deref(), &mut rng)?;
    let mut world = scenes::get_world(objects)?;
    diagnostics.advise(&format!(
        "{:?} scene with {} primitives",
        cli_args.scene,
        world.prims()
    ));

    let mut ctx = SceneContext::new(cli_args.sampling(), rng);
    let probe = Probe::new(cli_args.grid, seed);

    let frames = cli_args.first_frame..cli_args.first_frame + cli_args.frames;
    for frame in frames {
        // mutate phase
        let extent = probe.prepare(&mut world, &mut ctx, frame)?;
        log::info!("frame {frame}: {}", world.info().replace('\n', " "));

        // read phase
        let coverage = probe.trace(&world, extent, ctx.sampling(), ctx.eval())?;
        log::info!(
            "frame {frame}: {} of {} rays hit ({:.1}%), mean diffuse {}",
            coverage.hits,
            coverage.rays,
            100.0 * coverage.fraction(),
            coverage.mean_diffuse()
        );
    }

    GeomStats::collect(&world).report();
    Ok(())
}

fn main() -> ExitCode {
    // Parsing cli args
    let cli_args = Arguments::parse();

    env_logger::Builder::new()
        .filter_level(cli_args.verbosity.log_level_filter())
        .init();

    // `-q` also silences advisories
    let diagnostics = Diagnostics::new(env!("CARGO_PKG_NAME"), cli_args.verbosity.is_silent());
    match run(&cli_args, &diagnostics) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match diagnostics.report_error(&err) {
            Some(code) => ExitCode::from(code as u8),
            None => ExitCode::SUCCESS,
        },
    }
}
