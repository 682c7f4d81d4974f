use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use pixelparade::{
    AnimParams, AnimationState, BannerController, ParadeResult, RasterImage,
    SequentialIndexSource, SpriteFetcher,
};

/// Deterministic in-memory "store": each index yields a solid 28x28 sprite
/// whose red channel encodes the index.
struct PaletteFetcher;

impl SpriteFetcher for PaletteFetcher {
    fn fetch(&self, index: u32) -> ParadeResult<RasterImage> {
        let r = (50 + index * 50 % 200) as u8;
        let data: Vec<u8> = std::iter::repeat_n([r, 80, 80, 255], 28 * 28)
            .flatten()
            .collect();
        RasterImage::from_rgba8(28, 28, data)
    }
}

fn new_controller() -> BannerController {
    BannerController::new(
        AnimParams::default(),
        Arc::new(PaletteFetcher),
        Box::new(SequentialIndexSource::new(0, 10_000)),
        800,
        168,
    )
    .unwrap()
}

fn pump_out_of_loading(c: &mut BannerController) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while c.state() == AnimationState::Loading {
        assert!(Instant::now() < deadline, "first sprite never arrived");
        c.tick(0.0).unwrap();
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn wait_for_ready(c: &BannerController, n: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while c.ready_sprites() < n {
        assert!(Instant::now() < deadline, "queue never reached {n} sprites");
        std::thread::sleep(Duration::from_millis(1));
    }
}

fn center_red(c: &BannerController) -> u8 {
    let stride = c.surface().width() as usize * 4;
    c.surface().data()[84 * stride + 84 * 4]
}

#[test]
fn full_cycle_visits_every_state_in_order() {
    let mut c = new_controller();
    pump_out_of_loading(&mut c);
    wait_for_ready(&c, 2);

    let mut states = vec![c.state()];
    let mut t = 0.0;
    // One full cycle: entrance + display + nod + exit, with margin.
    let total_ms = 7500.0 + 5000.0 + 800.0 + 7500.0 + 200.0;
    while t <= total_ms {
        c.tick(t).unwrap();
        if *states.last().unwrap() != c.state() {
            states.push(c.state());
        }
        t += 16.0;
    }

    assert_eq!(
        states,
        vec![
            AnimationState::Entrance,
            AnimationState::Display,
            AnimationState::Nod,
            AnimationState::Exit,
            AnimationState::Display,
        ]
    );
    c.shutdown();
}

#[test]
fn queue_stays_bounded_throughout_the_cycle() {
    let mut c = new_controller();
    pump_out_of_loading(&mut c);

    let mut t = 0.0;
    while t <= 21_000.0 {
        c.tick(t).unwrap();
        assert!(c.ready_sprites() <= 3, "queue exceeded capacity at t={t}");
        t += 16.0;
    }
    c.shutdown();
}

#[test]
fn exit_promotes_the_next_sprite() {
    let mut c = new_controller();
    pump_out_of_loading(&mut c);
    wait_for_ready(&c, 2);

    // Settle in Display and sample the first sprite's color.
    let mut t = 0.0;
    while c.state() != AnimationState::Display {
        c.tick(t).unwrap();
        t += 16.0;
    }
    c.tick(t).unwrap();
    // Worker completion order is not index order; any of the first few
    // sprites may have landed first, but each carries a distinct red shade.
    let first = center_red(&c);
    assert!([50, 100, 150].contains(&first), "unexpected shade {first}");

    // Run through nod + exit until Display returns.
    let mut transitions = 0;
    let mut last = c.state();
    while !(c.state() == AnimationState::Display && transitions >= 3) {
        t += 16.0;
        c.tick(t).unwrap();
        if c.state() != last {
            transitions += 1;
            last = c.state();
        }
        assert!(t < 60_000.0, "cycle never completed");
    }

    c.tick(t + 16.0).unwrap();
    let second = center_red(&c);
    assert_ne!(second, first, "a different sprite should replace the first");
    c.shutdown();
}

#[test]
fn frame_phase_is_continuous_across_transitions() {
    let mut c = new_controller();
    pump_out_of_loading(&mut c);

    let start_frame = c.frame_index();
    let mut ticks = 0u32;
    let mut t = 0.0;
    while t <= 14_000.0 {
        c.tick(t).unwrap();
        ticks += 1;
        assert_eq!(c.frame_index(), (start_frame + ticks) % 36);
        t += 16.0;
    }
    c.shutdown();
}
