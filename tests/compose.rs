use snapstrip::camera::Photo;
use snapstrip::canvas::FrameRgba;
use snapstrip::color::Color;
use snapstrip::compose::{CompositionOptions, render_composition, system_fonts_available};
use snapstrip::layout::{LOGO_AREA_HEIGHT, LayoutId, all_layouts, layout};
use snapstrip::theme::theme;

fn solid_photo(w: u32, h: u32, color: Color) -> Photo {
    let jpeg = FrameRgba::with_fill(w, h, color).encode_jpeg(92).unwrap();
    Photo::from_jpeg(jpeg)
}

fn photos_for(count: usize) -> Vec<Photo> {
    (0..count)
        .map(|i| {
            solid_photo(
                320,
                240,
                Color {
                    r: (i as u8) * 29,
                    g: 120,
                    b: 255 - (i as u8) * 29,
                },
            )
        })
        .collect()
}

fn px(f: &FrameRgba, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * f.width + x) as usize) * 4;
    [f.data[i], f.data[i + 1], f.data[i + 2], f.data[i + 3]]
}

#[test]
fn every_layout_composes_full_set() {
    for l in all_layouts() {
        let photos = photos_for(l.photo_count);
        let out = render_composition(&photos, l, &CompositionOptions::default()).unwrap();
        assert_eq!((out.width, out.height), (l.canvas_width, l.canvas_height));
        // Every slot center shows photo content, not the white frame.
        for (i, slot) in l.slots.iter().enumerate() {
            let p = px(
                &out,
                (slot.x + slot.width / 2.0) as u32,
                (slot.y + slot.height / 2.0) as u32,
            );
            assert_ne!(
                p,
                [255, 255, 255, 255],
                "layout '{}' slot {i} left empty",
                l.id.as_str()
            );
        }
    }
}

#[test]
fn frame_color_shows_in_padding() {
    let l = layout(LayoutId::TwoByTwoVertical);
    let opts = CompositionOptions {
        frame_color: Some(Color::from_hex("#a8d8ea").unwrap()),
        theme: None,
    };
    let out = render_composition(&photos_for(4), l, &opts).unwrap();
    assert_eq!(px(&out, 5, 5), [0xa8, 0xd8, 0xea, 255]);
}

#[test]
fn composition_is_deterministic_with_theme_and_caption() {
    let l = layout(LayoutId::OneByFourStrip);
    let opts = CompositionOptions {
        frame_color: Some(Color::from_hex("#f8b4c8").unwrap()),
        theme: theme("cottagecore").cloned(),
    };
    let photos = photos_for(4);
    let a = render_composition(&photos, l, &opts).unwrap();
    let b = render_composition(&photos, l, &opts).unwrap();
    assert_eq!(a.data, b.data);
}

#[test]
fn caption_color_tracks_frame_lightness() {
    if !system_fonts_available() {
        eprintln!("skipping: no system fonts");
        return;
    }
    let l = layout(LayoutId::Single);
    let band_y = l.canvas_height - LOGO_AREA_HEIGHT;

    // Light frame: caption darkens pixels.
    let light = render_composition(&[], l, &CompositionOptions::default()).unwrap();
    let band = light.crop(0, band_y, l.canvas_width, LOGO_AREA_HEIGHT);
    assert!(band.data.chunks_exact(4).any(|p| p[0] < 250));

    // Dark frame: caption brightens pixels.
    let opts = CompositionOptions {
        frame_color: Some(Color::BLACK),
        theme: None,
    };
    let dark = render_composition(&[], l, &opts).unwrap();
    let band = dark.crop(0, band_y, l.canvas_width, LOGO_AREA_HEIGHT);
    assert!(band.data.chunks_exact(4).any(|p| p[0] > 5));
}

#[test]
fn vintage_layouts_never_get_a_caption() {
    for id in [LayoutId::VintageStrip, LayoutId::VintageFourAcross] {
        let l = layout(id);
        let out = render_composition(&[], l, &CompositionOptions::default()).unwrap();
        assert!(
            out.data.chunks_exact(4).all(|p| p == [255, 255, 255, 255]),
            "layout '{}' canvas should be untouched white",
            l.id.as_str()
        );
    }
}

#[test]
fn partial_photo_set_composes() {
    let l = layout(LayoutId::TwoByFourGrid);
    let out = render_composition(&photos_for(3), l, &CompositionOptions::default()).unwrap();
    // Filled slots have content, the rest keep the frame color.
    let filled = &l.slots[2];
    let empty = &l.slots[5];
    assert_ne!(
        px(
            &out,
            (filled.x + 20.0) as u32,
            (filled.y + 20.0) as u32
        ),
        [255, 255, 255, 255]
    );
    assert_eq!(
        px(&out, (empty.x + 20.0) as u32, (empty.y + 20.0) as u32),
        [255, 255, 255, 255]
    );
}
