use std::time::{Duration, Instant};

use format_sid::{FormatError, SidHeader, SidTune, TuneFormat};
use sid_player::{
    FrameTiming, Observable, OutputFormat, Paced, PlayState, Player, PlayerConfig, PlayerError,
    Recorder, Request, SidCommand, Socket, SocketConfig, TextSink, Value, VideoStandard,
};

fn tune(
    format: TuneFormat,
    init: u16,
    play: u16,
    code: &[u8],
    tweak: impl FnOnce(&mut SidHeader),
) -> Vec<u8> {
    tune_at(format, 0x1000, init, play, code, tweak)
}

fn tune_at(
    format: TuneFormat,
    load: u16,
    init: u16,
    play: u16,
    code: &[u8],
    tweak: impl FnOnce(&mut SidHeader),
) -> Vec<u8> {
    let mut header = SidHeader::new(format);
    header.load_address = load;
    header.init_address = init;
    header.play_address = play;
    tweak(&mut header);
    SidTune {
        header,
        load_address: load,
        payload: code.to_vec(),
    }
    .to_bytes()
}

fn load_player(data: &[u8]) -> Player<Recorder> {
    load_player_with(PlayerConfig::default(), data)
}

fn load_player_with(config: PlayerConfig, data: &[u8]) -> Player<Recorder> {
    let mut player = Player::new(config, Recorder::new());
    player.load(data).expect("tune parses");
    player
}

fn writes(player: &Player<Recorder>) -> Vec<(u8, u8, u8)> {
    player.transport().writes().collect()
}

// init: LDA #$0F; STA $D418; RTS. play: RTS
const ONE_WRITE: [u8; 7] = [0xA9, 0x0F, 0x8D, 0x18, 0xD4, 0x60, 0x60];

#[test]
fn init_write_is_sent_once() {
    let mut player = load_player(&tune(TuneFormat::Psid, 0x1000, 0x1006, &ONE_WRITE, |_| {}));
    player.init_subtune(1).expect("init returns");
    assert_eq!(player.state(), PlayState::RunningSimulated);

    for _ in 0..3 {
        player.run_frame();
    }

    assert_eq!(writes(&player), vec![(0, 0x18, 0x0F)]);
    let recorder = player.transport();
    // LDA # takes 2 cycles, STA abs writes on its 4th
    assert_eq!(
        recorder.commands[0],
        SidCommand::Write {
            chip: 0,
            register: 0x18,
            value: 0x0F,
            delay: 6
        }
    );
    assert!(
        recorder
            .commands
            .iter()
            .any(|c| matches!(c, SidCommand::Delay { .. }))
    );
    assert_eq!(recorder.resets, 1);
    assert!(!recorder.muted);
    assert_eq!(recorder.standard, Some(VideoStandard::Pal));

    let Some(Value::U64(frames)) = player.query("frames") else {
        panic!("frames not reported");
    };
    assert!(frames >= 2);
}

#[test]
fn authentic_mode_drops_repeated_writes() {
    // LDA #$0F; STA $D418; STA $D418; RTS
    let code = [0xA9, 0x0F, 0x8D, 0x18, 0xD4, 0x8D, 0x18, 0xD4, 0x60];

    let mut rsid = load_player(&tune(TuneFormat::Rsid, 0x1000, 0, &code, |_| {}));
    rsid.init_subtune(1).expect("starts");
    assert_eq!(rsid.state(), PlayState::RunningAuthentic);
    // Long enough for the KERNAL timer interrupt to come and go
    rsid.run_cycles(40_000);
    assert_eq!(writes(&rsid), vec![(0, 0x18, 0x0F)]);

    let mut psid = load_player(&tune(TuneFormat::Psid, 0x1000, 0, &code, |_| {}));
    psid.init_subtune(1).expect("init returns");
    assert_eq!(writes(&psid), vec![(0, 0x18, 0x0F), (0, 0x18, 0x0F)]);
}

#[rustfmt::skip]
const RASTER_IRQ_TUNE: [u8; 0x2F] = [
    0x78,             // $1000 SEI
    0xA9, 0x20,       //       LDA #<irq
    0x8D, 0x14, 0x03, //       STA $0314
    0xA9, 0x10,       //       LDA #>irq
    0x8D, 0x15, 0x03, //       STA $0315
    0xA9, 0x7F,       //       LDA #$7F
    0x8D, 0x0D, 0xDC, //       STA $DC0D   CIA 1 interrupts off
    0xA9, 0x01,       //       LDA #$01
    0x8D, 0x1A, 0xD0, //       STA $D01A   raster interrupt on
    0xA9, 0x64,       //       LDA #100
    0x8D, 0x12, 0xD0, //       STA $D012
    0xA9, 0x0B,       //       LDA #$0B
    0x8D, 0x11, 0xD0, //       STA $D011
    0x60,             //       RTS
    0xEE, 0x19, 0xD0, // $1020 INC $D019   acknowledge
    0xEE, 0x00, 0xC0, //       INC $C000
    0xAD, 0x00, 0xC0, //       LDA $C000
    0x8D, 0x01, 0xD4, //       STA $D401
    0x4C, 0x81, 0xEA, //       JMP $EA81
];

#[test]
fn rsid_raster_interrupt_plays_once_per_frame() {
    let mut player = load_player(&tune(TuneFormat::Rsid, 0x1000, 0, &RASTER_IRQ_TUNE, |_| {}));
    player.init_subtune(1).expect("starts");
    player.run_cycles(3 * u64::from(VideoStandard::Pal.cycles_per_frame()));

    assert_eq!(writes(&player), vec![(0, 1, 1), (0, 1, 2), (0, 1, 3)]);
    assert_eq!(player.query("ram.C000"), Some(Value::U8(3)));
}

#[test]
fn runaway_init_is_abandoned() {
    let config = PlayerConfig {
        init_budget: 1000,
        ..PlayerConfig::default()
    };
    // JMP $1000
    let mut player = load_player_with(
        config,
        &tune(TuneFormat::Psid, 0x1000, 0x1000, &[0x4C, 0x00, 0x10], |_| {}),
    );

    let result = player.init_subtune(1);
    assert!(matches!(
        result,
        Err(PlayerError::InitTimeout {
            subtune: 1,
            budget: 1000
        })
    ));
    assert_eq!(player.state(), PlayState::Idle);
    assert!(player.is_broken(1));
    assert_eq!(player.run_frame(), 0);

    // A working tune still loads afterwards
    player
        .load(&tune(TuneFormat::Psid, 0x1000, 0x1006, &ONE_WRITE, |_| {}))
        .expect("loads");
    player.init_subtune(1).expect("init returns");
    assert!(!player.is_broken(1));
}

#[test]
fn rom_is_banked_out_under_init_and_play() {
    let mut player = load_player(&tune_at(
        TuneFormat::Psid,
        0xA000,
        0xA000,
        0xA001,
        &[0x60, 0x60],
        |_| {},
    ));
    player.init_subtune(1).expect("init returns");
    assert_eq!(player.query("bank"), Some(Value::U8(0x36)));
    player.run_frame();
    player.run_frame();
    assert_eq!(player.state(), PlayState::RunningSimulated);

    let mut player = load_player(&tune(TuneFormat::Psid, 0x1000, 0xE000, &[0x60], |_| {}));
    player.init_subtune(1).expect("init returns");
    assert_eq!(player.query("bank"), Some(Value::U8(0x35)));

    let mut player = load_player(&tune(TuneFormat::Psid, 0x1000, 0x1000, &[0x60], |_| {}));
    player.init_subtune(1).expect("init returns");
    assert_eq!(player.query("bank"), Some(Value::U8(0x37)));
}

#[test]
fn play_under_kernal_is_reached_from_basic_bank() {
    // Image $9000-$E00F: init at $9000 leaves BASIC banked out, play at
    // $E000 sits under the KERNAL.
    let mut image = vec![0; 0xE010 - 0x9000];
    image[0] = 0x60;
    image[0x5000..0x5006].copy_from_slice(&[0xA9, 0x0F, 0x8D, 0x18, 0xD4, 0x60]);
    let mut player = load_player(&tune_at(
        TuneFormat::Psid,
        0x9000,
        0x9000,
        0xE000,
        &image,
        |_| {},
    ));
    player.init_subtune(1).expect("init returns");
    assert_eq!(player.query("bank"), Some(Value::U8(0x35)));

    for _ in 0..4 {
        player.run_frame();
    }
    let writes = writes(&player);
    assert!(writes.len() >= 3, "{writes:?}");
    assert!(writes.iter().all(|&write| write == (0, 0x18, 0x0F)));
}

#[rustfmt::skip]
const KERNAL_VECTOR_TUNE: [u8; 0x1C] = [
    0xA9, 0x10,       // $1000 LDA #<irq
    0x8D, 0x14, 0x03, //       STA $0314
    0xA9, 0x10,       //       LDA #>irq
    0x8D, 0x15, 0x03, //       STA $0315
    0x60,             //       RTS
    0xEA, 0xEA, 0xEA, 0xEA, 0xEA,
    0xEE, 0x00, 0xC0, // $1010 INC $C000
    0xAD, 0x00, 0xC0, //       LDA $C000
    0x8D, 0x01, 0xD4, //       STA $D401
    0x4C, 0x31, 0xEA, //       JMP $EA31
];

#[test]
fn interrupt_handler_plays_when_header_has_no_play_address() {
    let mut player = load_player(&tune(TuneFormat::Psid, 0x1000, 0, &KERNAL_VECTOR_TUNE, |_| {}));
    player.init_subtune(1).expect("init returns");
    for _ in 0..3 {
        player.run_frame();
    }

    let writes = writes(&player);
    assert!(writes.len() >= 2, "{writes:?}");
    for (i, write) in writes.iter().enumerate() {
        assert_eq!(*write, (0, 1, i as u8 + 1));
    }
}

#[test]
fn frame_length_follows_cia_timer() {
    // LDA #$C7; STA $DC04; LDA #$4C; STA $DC05; RTS; RTS
    let code = [0xA9, 0xC7, 0x8D, 0x04, 0xDC, 0xA9, 0x4C, 0x8D, 0x05, 0xDC, 0x60, 0x60];
    let mut player = load_player(&tune(TuneFormat::Psid, 0x1000, 0x100B, &code, |_| {}));
    player.init_subtune(1).expect("init returns");
    assert_eq!(player.timing(), FrameTiming::CiaTimer);
    assert_eq!(player.frame_cycles(), 0x4CC7);

    player.run_frame();
    player.run_frame();
    assert_eq!(player.query("cia1.icr.status"), Some(Value::U8(0x83)));

    let speed_flagged = tune(TuneFormat::Psid, 0x1000, 0x1000, &[0x60], |h| h.speed = 1);
    let mut player = load_player(&speed_flagged);
    player.init_subtune(1).expect("init returns");
    assert_eq!(player.timing(), FrameTiming::CiaTimer);
    assert_eq!(player.frame_cycles(), 0x4024);

    let mut player = load_player(&tune(TuneFormat::Psid, 0x1000, 0x1000, &[0x60], |_| {}));
    player.init_subtune(1).expect("init returns");
    assert_eq!(player.timing(), FrameTiming::Raster);
    assert_eq!(player.frame_cycles(), 19_656);
}

#[test]
fn subtune_requests_and_wraparound() {
    // STA $D400 (A holds subtune - 1); RTS; play: RTS
    let code = [0x8D, 0x00, 0xD4, 0x60, 0x60];
    let mut player = load_player(&tune(TuneFormat::Psid, 0x1000, 0x1004, &code, |h| {
        h.songs = 3;
    }));
    player.init_subtune(1).expect("init returns");

    player.request(Request::Subtune(2));
    player.step();
    assert_eq!(player.subtune(), 2);
    assert_eq!(writes(&player).last(), Some(&(0, 0, 1)));

    assert_eq!(player.next_subtune().expect("next"), 3);
    assert_eq!(player.next_subtune().expect("next"), 1);
    assert_eq!(player.previous_subtune().expect("previous"), 3);

    let controller = player.controller();
    std::thread::spawn(move || controller.send(Request::Previous).expect("player alive"))
        .join()
        .expect("thread finished");
    player.step();
    assert_eq!(player.subtune(), 2);

    player.init_subtune(0).expect("clamped");
    assert_eq!(player.subtune(), 1);
    player.init_subtune(99).expect("clamped");
    assert_eq!(player.subtune(), 3);
    assert_eq!(player.transport().resets, 8);

    player.request(Request::Stop);
    player.step();
    assert_eq!(player.state(), PlayState::Idle);
    assert!(player.transport().muted);
}

#[test]
fn load_request_starts_default_subtune() {
    let mut player = Player::new(PlayerConfig::default(), Recorder::new());
    let data = tune(TuneFormat::Psid, 0x1000, 0x1004, &[0x8D, 0x00, 0xD4, 0x60, 0x60], |h| {
        h.songs = 4;
        h.start_song = 3;
    });
    player.request(Request::Load(data));
    player.step();
    assert_eq!(player.subtune(), 3);
    assert_eq!(player.state(), PlayState::RunningSimulated);
}

#[test]
fn play_time_and_time_of_day_advance_with_samples() {
    let config = PlayerConfig {
        sample_rate: 1000,
        ..PlayerConfig::default()
    };
    let mut player = load_player_with(
        config,
        &tune(TuneFormat::Psid, 0x1000, 0x1006, &ONE_WRITE, |_| {}),
    );
    player.init_subtune(1).expect("init returns");
    for _ in 0..1000 {
        player.run_sample();
    }
    assert_eq!(player.play_time(), 1);
    assert_eq!(
        player.query("cia1.tod"),
        Some(Value::String("00:00:01.0".into()))
    );
}

#[test]
fn failed_load_keeps_previous_tune() {
    let mut player = Player::new(PlayerConfig::default(), Recorder::new());
    assert!(matches!(player.init_subtune(1), Err(PlayerError::NoTune)));

    player
        .load(&tune(TuneFormat::Psid, 0x1000, 0x1006, &ONE_WRITE, |_| {}))
        .expect("loads");
    let result = player.load(b"not a tune");
    assert!(matches!(
        result,
        Err(PlayerError::Format(FormatError::TooShort { len: 10 }))
    ));
    assert!(player.tune_info().is_some());
    player.init_subtune(1).expect("previous tune still plays");
}

#[test]
fn second_chip_needs_a_second_slot() {
    // LDA #1; STA $D420; LDA #2; STA $D400; RTS; RTS
    let code = [0xA9, 0x01, 0x8D, 0x20, 0xD4, 0xA9, 0x02, 0x8D, 0x00, 0xD4, 0x60, 0x60];
    let data = tune(TuneFormat::Psid, 0x1000, 0x100B, &code, |h| h.extra[0] = 0x42);

    let dual = PlayerConfig {
        sockets: SocketConfig::new(Socket::DUAL, Socket::OFF),
        ..PlayerConfig::default()
    };
    let mut player = load_player_with(dual, &data);
    player.init_subtune(1).expect("init returns");
    assert_eq!(writes(&player), vec![(1, 0, 1), (0, 0, 2)]);
    assert_eq!(player.sid_map().enabled_count(), 2);

    let mut player = load_player(&data);
    player.init_subtune(1).expect("init returns");
    assert_eq!(writes(&player), vec![(0, 0, 2)]);
}

#[test]
fn ntsc_tunes_run_on_ntsc_timing() {
    let data = tune(TuneFormat::Psid, 0x1000, 0x1006, &ONE_WRITE, |h| h.flags = 0x08);
    let mut player = load_player(&data);
    player.init_subtune(1).expect("init returns");
    assert_eq!(player.transport().standard, Some(VideoStandard::Ntsc));
    assert_eq!(player.frame_cycles(), 17_095);
    assert_eq!(player.clock_hz(), 1_022_727);
    assert_eq!(player.query("ram.02A6"), Some(Value::U8(0)));
}

#[test]
fn text_output_of_a_session() {
    let data = tune(TuneFormat::Psid, 0x1000, 0x1006, &ONE_WRITE, |_| {});
    let sink = TextSink::new(Vec::new(), OutputFormat::Text, SocketConfig::default());
    let mut player = Player::new(PlayerConfig::default(), sink);
    player.load(&data).expect("loads");
    player.init_subtune(1).expect("init returns");

    let out = player.into_transport().finish().expect("no I/O errors");
    let text = String::from_utf8(out).expect("utf-8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines,
        ["mute on", "mute on", "reset", "clock 985248", "    6 W $18 0F", "mute off"]
    );
}

#[test]
fn authentic_time_is_reported_to_the_transport() {
    let mut rsid = load_player(&tune(TuneFormat::Rsid, 0x1000, 0, &RASTER_IRQ_TUNE, |_| {}));
    rsid.init_subtune(1).expect("starts");
    let consumed = rsid.run_cycles(2 * u64::from(VideoStandard::Pal.cycles_per_frame()));
    assert_eq!(rsid.transport().elapsed, consumed);

    let mut psid = load_player(&tune(TuneFormat::Psid, 0x1000, 0x1006, &ONE_WRITE, |_| {}));
    psid.init_subtune(1).expect("init returns");
    psid.run_cycles(2 * u64::from(VideoStandard::Pal.cycles_per_frame()));
    assert_eq!(psid.transport().elapsed, 0);
}

#[test]
fn realtime_rsid_runs_at_machine_speed() {
    let data = tune(TuneFormat::Rsid, 0x1000, 0, &RASTER_IRQ_TUNE, |_| {});
    let transport = Paced::new(Recorder::new(), Duration::from_secs(1));
    let mut player = Player::new(PlayerConfig::default(), transport);
    player.load(&data).expect("tune parses");
    player.init_subtune(1).expect("starts");

    // A quarter second of machine time
    let start = Instant::now();
    player.run_cycles(u64::from(VideoStandard::Pal.cpu_clock() / 4));
    assert!(start.elapsed() >= Duration::from_millis(240), "{:?}", start.elapsed());
    assert_eq!(player.transport().pacer().desyncs(), 0);
    assert!(!player.into_transport().into_inner().commands.is_empty());
}
