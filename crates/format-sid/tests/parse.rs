use format_sid::{
    Channel, FormatError, HEADER_V1_SIZE, MULTI_SID_VERSION, SidHeader, SidModel, SidTune,
    TuneFormat,
};

fn tune(format: TuneFormat, load_address: u16, header_load: u16) -> SidTune {
    let mut header = SidHeader::new(format);
    header.load_address = header_load;
    header.init_address = 0x1000;
    header.play_address = 0x1003;
    header.songs = 12;
    header.start_song = 3;
    header.speed = 0x8000_0005;
    header.title = "Synthetic".into();
    header.author = "Nobody".into();
    header.released = "2024 Test".into();
    header.flags = 0x0024; // PAL, 8580
    SidTune {
        header,
        load_address,
        payload: vec![0x60, 0xEA, 0x60],
    }
}

#[test]
fn encode_then_parse_keeps_fields() {
    for header_load in [0x1000, 0] {
        for format in [TuneFormat::Psid, TuneFormat::Rsid] {
            let original = tune(format, 0x1000, header_load);
            let parsed = SidTune::parse(&original.to_bytes()).expect("parses");

            assert_eq!(parsed.load_address, 0x1000);
            assert_eq!(parsed.payload, original.payload);
            assert_eq!(parsed.header.format, format);
            assert_eq!(parsed.header.init_address, 0x1000);
            assert_eq!(parsed.header.play_address, 0x1003);
            assert_eq!(parsed.header.songs, 12);
            assert_eq!(parsed.header.start_song, 3);
            assert_eq!(parsed.header.speed, 0x8000_0005);
            assert_eq!(parsed.header.title, "Synthetic");
            assert_eq!(parsed.header.released, "2024 Test");
            assert_eq!(parsed.header.chips(), original.header.chips());
            assert_eq!(parsed, original);
        }
    }
}

#[test]
fn multi_sid_chip_set_survives_encoding() {
    let mut original = tune(TuneFormat::Psid, 0x0801, 0x0801);
    original.header.version = MULTI_SID_VERSION;
    original.header.data_offset = 0x80;
    original.header.extra = [0x42, 0x60, 0xE0, 0xA0, 0x00, 0x00];

    let parsed = SidTune::parse(&original.to_bytes()).expect("parses");
    let chips = parsed.header.chips();
    assert_eq!(chips, original.header.chips());
    assert_eq!(chips[1].base, Some(0xD420));
    assert_eq!(chips[1].model, SidModel::Mos8580);
    assert_eq!(chips[1].channel, Channel::Right);
    assert_eq!(chips[2].base, Some(0xDE00));
    assert_eq!(chips[2].channel, Channel::Both);
    assert_eq!(chips[3].base, None);
}

#[test]
fn version_1_header_has_no_flags() {
    let mut original = tune(TuneFormat::Psid, 0x1000, 0x1000);
    original.header.version = 1;
    original.header.data_offset = HEADER_V1_SIZE;
    let bytes = original.to_bytes();
    assert_eq!(bytes.len(), 0x76 + 3);

    let parsed = SidTune::parse(&bytes).expect("parses");
    assert_eq!(parsed.header.flags, 0);
    assert_eq!(parsed.header.primary_model(), SidModel::Mos6581);
    assert_eq!(parsed.header.chip_count(), 1);
}

#[test]
fn end_address_is_capped() {
    let mut t = tune(TuneFormat::Psid, 0xFFF0, 0xFFF0);
    assert_eq!(t.end_address(), 0xFFF3);
    t.payload = vec![0; 0x20];
    assert_eq!(t.end_address(), 0xFFFF);
    assert!(t.is_truncated());
}

#[test]
fn rejects_bad_files() {
    assert_eq!(
        SidTune::parse(b"PSID"),
        Err(FormatError::TooShort { len: 4 })
    );

    let mut bytes = tune(TuneFormat::Psid, 0x1000, 0x1000).to_bytes();
    bytes[0] = b'X';
    assert_eq!(
        SidTune::parse(&bytes),
        Err(FormatError::BadMagic(*b"XSID"))
    );

    let mut bytes = tune(TuneFormat::Psid, 0x1000, 0x1000).to_bytes();
    bytes[6] = 0x01; // data offset $017C
    assert!(matches!(
        SidTune::parse(&bytes),
        Err(FormatError::HeaderOutOfBounds { offset: 0x017C, .. })
    ));

    let mut bytes = tune(TuneFormat::Psid, 0x1000, 0x1000).to_bytes();
    bytes[7] = 0x10;
    assert_eq!(SidTune::parse(&bytes), Err(FormatError::BadDataOffset(0x10)));

    let header_only = SidHeader::new(TuneFormat::Psid).to_bytes();
    assert_eq!(
        SidTune::parse(&header_only),
        Err(FormatError::MissingLoadAddress)
    );

    let mut with_address_only = header_only.clone();
    with_address_only.extend_from_slice(&[0x00, 0x10]);
    assert_eq!(
        SidTune::parse(&with_address_only),
        Err(FormatError::EmptyPayload)
    );
}

#[test]
fn init_defaults_to_load_address() {
    let mut t = tune(TuneFormat::Psid, 0x2000, 0x2000);
    t.header.init_address = 0;
    assert_eq!(t.init_address(), 0x2000);
}
