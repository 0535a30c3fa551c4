mod common;

use collagekit::{
    CollageConfig, CollageRequest, CompositionState, Compositor, Error, GridSpec, RenderSurface,
    SourceImage,
};
use common::*;
use image::{DynamicImage, ImageFormat, RgbImage};

fn request(images: Vec<SourceImage>, grid: GridSpec) -> CollageRequest {
    CollageRequest::new(images, "Test Style", grid)
}

#[tokio::test]
async fn surface_matches_configured_dimensions() {
    let grids = [
        (GridSpec::square(1024, 2, 10), 4),
        (GridSpec::square(300, 3, 6), 9),
        (
            GridSpec {
                canvas_width: 640,
                canvas_height: 220,
                rows: 1,
                cols: 3,
                gap: 10,
            },
            3,
        ),
    ];

    for (grid, n) in grids {
        let mut surface = RenderSurface::new(1, 1).unwrap();
        let mut compositor = Compositor::default();
        let images = (0..n).map(|_| solid_png(40, 30, RED)).collect();
        let artifact = compositor.compose(&mut surface, &request(images, grid)).await.unwrap();
        assert_eq!((surface.width(), surface.height()), (grid.canvas_width, grid.canvas_height));
        assert_eq!((artifact.width, artifact.height), (grid.canvas_width, grid.canvas_height));
        assert_eq!(artifact.cells.len(), n);
    }
}

#[tokio::test]
async fn reference_geometry_for_default_config() {
    let config = CollageConfig::default();
    let mut surface = RenderSurface::new(config.canvas_width, config.canvas_height).unwrap();
    let mut compositor = collagekit::new_compositor(&config).unwrap();
    let artifact = compositor
        .compose(&mut surface, &request(four_solids(), config.grid_spec()))
        .await
        .unwrap();

    let origins: Vec<(f32, f32, f32)> = artifact.cells.iter().map(|c| (c.x, c.y, c.size())).collect();
    assert_eq!(
        origins,
        vec![
            (10.0, 10.0, 497.0),
            (517.0, 10.0, 497.0),
            (10.0, 517.0, 497.0),
            (517.0, 517.0, 497.0)
        ]
    );

    // gap pixels show the background, cell centers show their image
    assert_eq!(surface.pixel(5, 500), Some(config.background));
    assert_eq!(surface.pixel(512, 512), Some(config.background));
    for (cell, color) in artifact.cells.iter().zip([RED, GREEN, BLUE, YELLOW]) {
        let px = surface
            .pixel((cell.x + 250.0) as u32, (cell.y + 400.0) as u32)
            .unwrap();
        assert!(near(px, color), "cell {} has {:?}", cell.index, px);
    }
}

#[tokio::test]
async fn cover_fit_crops_overflow_evenly() {
    // 200x100: the centered square crop spans x = 50..150, half black, half white
    let images = vec![split_png(200, 100)];
    let grid = GridSpec::square(517, 1, 10);
    let mut surface = RenderSurface::new(1, 1).unwrap();
    let mut compositor = Compositor::default();
    compositor
        .compose(&mut surface, &CollageRequest::new(images, "", grid))
        .await
        .unwrap();

    assert!(near(surface.pixel(110, 300).unwrap(), [0, 0, 0, 255]));
    assert!(near(surface.pixel(400, 300).unwrap(), [255, 255, 255, 255]));
}

#[tokio::test]
async fn failed_decode_leaves_blank_surface_untouched() {
    let mut images = four_solids();
    images[2] = SourceImage::from(b"definitely not a png".to_vec());

    let mut surface = RenderSurface::new(1024, 1024).unwrap();
    let before = surface.pixmap().data().to_vec();
    let mut compositor = Compositor::default();
    let err = compositor
        .compose(&mut surface, &request(images, GridSpec::square(1024, 2, 10)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ImageDecodeError { index: 2, .. }));
    assert_eq!(compositor.state(), CompositionState::Idle);
    assert!(!surface.is_composed());
    assert_eq!(surface.pixmap().data(), &before[..]);
    assert!(collagekit::export_png(&surface, "collage.png").is_err());
}

#[tokio::test]
async fn failed_decode_keeps_previous_collage() {
    let grid = GridSpec::square(256, 2, 8);
    let mut surface = RenderSurface::new(256, 256).unwrap();
    let mut compositor = Compositor::default();
    let first = compositor
        .compose(&mut surface, &request(four_solids(), grid))
        .await
        .unwrap();
    let before = surface.pixmap().data().to_vec();

    let mut broken = four_solids();
    broken[0] = SourceImage::from(Vec::new());
    assert!(compositor.compose(&mut surface, &request(broken, grid)).await.is_err());

    assert_eq!(surface.generation(), first.generation);
    assert_eq!(surface.pixmap().data(), &before[..]);
    // the last successful composition is still exportable
    assert!(first.export(&surface, "collage.png").is_ok());
}

#[tokio::test]
async fn image_count_mismatch_is_invalid_grid() {
    let mut surface = RenderSurface::new(64, 64).unwrap();
    let mut compositor = Compositor::default();
    let mut images = four_solids();
    images.pop();
    let err = compositor
        .compose(&mut surface, &request(images, GridSpec::square(1024, 2, 10)))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidGridError(_)));
}

#[tokio::test]
async fn composing_twice_is_byte_identical() {
    let grid = GridSpec::square(512, 2, 10);
    let mut outputs = Vec::new();
    for _ in 0..2 {
        let mut surface = RenderSurface::new(512, 512).unwrap();
        let mut compositor = Compositor::default();
        let artifact = compositor
            .compose(&mut surface, &request(four_solids(), grid))
            .await
            .unwrap();
        outputs.push(artifact.export(&surface, "collage.png").unwrap());
    }
    assert_eq!(outputs[0].png_data, outputs[1].png_data);
    assert_eq!(outputs[0].digest(), outputs[1].digest());
}

#[tokio::test]
async fn export_after_compose_decodes_to_canvas_size() {
    let config = CollageConfig::default();
    let mut surface = RenderSurface::new(config.canvas_width, config.canvas_height).unwrap();
    let mut compositor = collagekit::new_compositor(&config).unwrap();
    let artifact = compositor
        .compose(&mut surface, &request(four_solids(), config.grid_spec()))
        .await
        .unwrap();

    let exported = artifact.export(&surface, &config.export_file_name).unwrap();
    assert_eq!(exported.file_name, "collage.png");
    assert!(!exported.png_data.is_empty());
    let decoded = image::load_from_memory(&exported.png_data).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (1024, 1024));
}

#[tokio::test]
async fn export_names_cannot_leave_the_save_dir() {
    let mut surface = RenderSurface::new(1, 1).unwrap();
    let mut compositor = Compositor::default();
    let artifact = compositor
        .compose(&mut surface, &request(four_solids(), GridSpec::square(64, 2, 4)))
        .await
        .unwrap();

    for name in ["/tmp/collagekit-escaped.png", "../collagekit-up.png", "sub/collage.png"] {
        assert!(
            matches!(artifact.export(&surface, name), Err(Error::ExportError(_))),
            "{:?} accepted",
            name
        );
    }

    let mut dir = std::env::temp_dir();
    dir.push(format!("collagekit-save-dir-{}", std::process::id()));
    let path = artifact.export(&surface, "collage.png").unwrap().save(&dir).unwrap();
    assert_eq!(path.parent(), Some(dir.as_path()));
    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn label_is_drawn_over_first_cell() {
    let mut surface = RenderSurface::new(1, 1).unwrap();
    let mut compositor = Compositor::default();
    compositor
        .compose(&mut surface, &request(four_solids(), GridSpec::square(1024, 2, 10)))
        .await
        .unwrap();

    // top bar of the leading "T" sits at (36..56, 36..40) with the default label style
    assert_eq!(surface.pixel(38, 37), Some((255, 255, 255, 255)));
    // just below the bar, between the stems, the darkened label backing covers the red cell
    let backing = surface.pixel(40, 45).unwrap();
    assert!(backing.0 < RED[0]);
}

#[tokio::test]
async fn mixed_formats_and_base64_inputs() {
    use base64::Engine as _;

    let jpeg = encode_jpeg(80, 60, [10, 120, 200]);
    let png = solid_png(30, 90, GREEN);
    let b64 = base64::engine::general_purpose::STANDARD.encode(png.as_bytes());
    let images = vec![
        SourceImage::from(jpeg),
        SourceImage::from_base64(1, &format!("data:image/png;base64,{}", b64)).unwrap(),
    ];
    let grid = GridSpec {
        canvas_width: 420,
        canvas_height: 220,
        rows: 1,
        cols: 2,
        gap: 10,
    };
    let mut surface = RenderSurface::new(1, 1).unwrap();
    let mut compositor = Compositor::default();
    let artifact = compositor
        .compose(&mut surface, &CollageRequest::new(images, "", grid))
        .await
        .unwrap();
    assert_eq!(artifact.cells[1].x, 215.0);
    assert!(near(surface.pixel(315, 110).unwrap(), GREEN));
}

fn encode_jpeg(w: u32, h: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, image::Rgb(rgb)));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Jpeg).unwrap();
    out.into_inner()
}
