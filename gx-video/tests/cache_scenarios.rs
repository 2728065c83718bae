//! End-to-end cache behavior through the public API: a software backend,
//! a counting decoder, and emulated system memory driving full
//! load / mutate / invalidate / copy sequences.

use std::cell::Cell;
use std::rc::Rc;

use gx_common::{PaletteFormat, SourceFormat};
use gx_video::{
    CacheConfig, CopySourceKind, CopyState, DecodedFormat, RawDecoder, SoftwareBackend,
    SoftwareFramebuffer, SourceRect, SystemMemory, TextureCache, TextureDecoder,
};

struct CountingDecoder {
    calls: Rc<Cell<usize>>,
}

impl TextureDecoder for CountingDecoder {
    fn decode(
        &self,
        out: &mut [u8],
        src: &[u8],
        expanded_width: u32,
        expanded_height: u32,
        format: SourceFormat,
        palette: &[u8],
        palette_format: PaletteFormat,
        want_rgba: bool,
    ) -> DecodedFormat {
        self.calls.set(self.calls.get() + 1);
        RawDecoder.decode(
            out,
            src,
            expanded_width,
            expanded_height,
            format,
            palette,
            palette_format,
            want_rgba,
        )
    }
}

fn cache_with_counter(config: CacheConfig) -> (TextureCache<SoftwareBackend>, Rc<Cell<usize>>) {
    let calls = Rc::new(Cell::new(0));
    let decoder = CountingDecoder {
        calls: Rc::clone(&calls),
    };
    let backend = SoftwareBackend::new(SoftwareFramebuffer::new(640, 528));
    (
        TextureCache::new(backend, config, Box::new(decoder)),
        calls,
    )
}

fn memory_with_rgba8_at(address: u32, width: u32, height: u32) -> SystemMemory {
    let mut mem = SystemMemory::new(4 * 1024 * 1024);
    let pixels: Vec<u8> = (0..width as usize * height as usize * 4)
        .map(|i| (i * 7 % 251) as u8)
        .collect();
    mem.write_ram(address, &pixels);
    mem
}

#[test]
fn identical_loads_hit_without_redecoding() {
    let (mut cache, calls) = cache_with_counter(CacheConfig::default());
    let mem = memory_with_rgba8_at(0x1000, 64, 64);

    let load = |cache: &mut TextureCache<SoftwareBackend>| {
        cache
            .load(
                &mem,
                0,
                0x1000,
                64,
                64,
                SourceFormat::Rgba8,
                0,
                PaletteFormat::Ia8,
                true,
                4,
            )
            .is_some()
    };

    assert!(load(&mut cache));
    assert_eq!(calls.get(), 1);
    // The second identical call must hit without invoking the decoder.
    assert!(load(&mut cache));
    assert_eq!(calls.get(), 1);
    assert_eq!(cache.entry_count(), 1);
}

#[test]
fn mutation_and_range_invalidation_force_full_rebuild() {
    let (mut cache, calls) = cache_with_counter(CacheConfig::default());
    let mut mem = memory_with_rgba8_at(0x1000, 64, 64);

    cache
        .load(
            &mem,
            0,
            0x1000,
            64,
            64,
            SourceFormat::Rgba8,
            0,
            PaletteFormat::Ia8,
            true,
            0,
        )
        .unwrap();
    let decodes_after_first = calls.get();

    // Mutate one byte of the source and invalidate the covering range.
    mem.write_ram(0x1000 + 100, &[0xEE]);
    cache.invalidate_range(0x1000, 64 * 64 * 4);
    assert_eq!(cache.entry_count(), 0);

    cache
        .load(
            &mem,
            0,
            0x1000,
            64,
            64,
            SourceFormat::Rgba8,
            0,
            PaletteFormat::Ia8,
            true,
            0,
        )
        .unwrap();
    assert_eq!(calls.get(), decodes_after_first + 1);
}

#[test]
fn silent_mutation_detected_by_hash_alone() {
    let (mut cache, calls) = cache_with_counter(CacheConfig::default());
    let mut mem = memory_with_rgba8_at(0x1000, 32, 32);

    let load = |cache: &mut TextureCache<SoftwareBackend>, mem: &SystemMemory| {
        cache
            .load(
                mem,
                0,
                0x1000,
                32,
                32,
                SourceFormat::Rgba8,
                0,
                PaletteFormat::Ia8,
                false,
                0,
            )
            .map(|_| ())
    };

    load(&mut cache, &mem).unwrap();
    // No invalidation call at all; the hash must catch the change.
    mem.write_ram(0x1000, &[0x01, 0x02, 0x03, 0x04]);
    load(&mut cache, &mem).unwrap();
    assert_eq!(calls.get(), 2);
}

#[test]
fn palette_rebind_produces_distinct_entries() {
    let (mut cache, _calls) = cache_with_counter(CacheConfig::default());
    let mut mem = memory_with_rgba8_at(0x1000, 16, 16);
    mem.write_tmem(0x0, &[0x10; 512]);

    let load = |cache: &mut TextureCache<SoftwareBackend>, mem: &SystemMemory| {
        cache
            .load(
                mem,
                0,
                0x1000,
                16,
                16,
                SourceFormat::C8,
                0x0,
                PaletteFormat::Rgb565,
                false,
                0,
            )
            .map(|e| e.key)
            .unwrap()
    };

    let key_a = load(&mut cache, &mem);
    mem.write_tmem(0x0, &[0x99; 512]);
    let key_b = load(&mut cache, &mem);

    // Both palette interpretations stay resident under distinct keys.
    assert_ne!(key_a, key_b);
    assert_eq!(cache.entry_count(), 2);

    // Rebinding the first palette again hits its original entry.
    mem.write_tmem(0x0, &[0x10; 512]);
    let key_c = load(&mut cache, &mem);
    assert_eq!(key_a, key_c);
    assert_eq!(cache.entry_count(), 2);
}

#[test]
fn copy_then_load_round_trip() {
    let (mut cache, calls) = cache_with_counter(CacheConfig::default());
    let mem = memory_with_rgba8_at(0x2000, 64, 64);

    cache.copy(
        0x2000,
        gx_common::copy::RGBA8,
        CopySourceKind::Color,
        SourceRect::new(0, 0, 64, 64),
        false,
        false,
    );

    // The copy is trusted by address: no decode, provenance preserved.
    let entry = cache
        .load(
            &mem,
            0,
            0x2000,
            64,
            64,
            SourceFormat::Rgba8,
            0,
            PaletteFormat::Ia8,
            false,
            0,
        )
        .unwrap();
    assert_eq!(entry.copy_state, CopyState::CopyReady);
    assert_eq!(calls.get(), 0);
}

#[test]
fn dynamic_copy_revalidates_on_every_load() {
    let (mut cache, calls) = cache_with_counter(CacheConfig {
        copy_to_texture: false,
        ..Default::default()
    });
    let mem = memory_with_rgba8_at(0x2000, 64, 64);

    cache.copy(
        0x2000,
        gx_common::copy::RGBA8,
        CopySourceKind::Color,
        SourceRect::new(0, 0, 64, 64),
        false,
        false,
    );

    let load = |cache: &mut TextureCache<SoftwareBackend>| {
        cache
            .load(
                &mem,
                0,
                0x2000,
                64,
                64,
                SourceFormat::Rgba8,
                0,
                PaletteFormat::Ia8,
                false,
                0,
            )
            .map(|e| e.copy_state)
            .unwrap()
    };

    // With direct copies disabled, the first RAM load over the copy
    // demotes it and decodes from memory.
    assert_eq!(load(&mut cache), CopyState::CopyDynamic);
    assert_eq!(calls.get(), 1);

    // Unchanged source hashes clean on the next load.
    assert_eq!(load(&mut cache), CopyState::CopyDynamic);
    assert_eq!(calls.get(), 1);
}

#[test]
fn copy_with_transform_remains_resident() {
    let calls = Rc::new(Cell::new(0));
    let backend = SoftwareBackend::new(SoftwareFramebuffer::new(8, 8));
    let fb = backend.framebuffer();
    for px in fb.borrow_mut().color.chunks_exact_mut(4) {
        px.copy_from_slice(&[40, 80, 120, 200]);
    }
    let mut cache = TextureCache::new(
        backend,
        CacheConfig::default(),
        Box::new(CountingDecoder {
            calls: Rc::clone(&calls),
        }),
    );

    cache.copy(
        0x3000,
        gx_common::copy::A8,
        CopySourceKind::Color,
        SourceRect::new(0, 0, 8, 8),
        false,
        false,
    );

    let mem = memory_with_rgba8_at(0x3000, 8, 8);
    let entry = cache
        .load(
            &mem,
            0,
            0x3000,
            8,
            8,
            SourceFormat::Rgba8,
            0,
            PaletteFormat::Ia8,
            false,
            0,
        )
        .unwrap();
    // Resident copy content is served as-is, untouched by any decode.
    assert_eq!(entry.copy_state, CopyState::CopyReady);
    assert_eq!(calls.get(), 0);
}

#[test]
fn eviction_spares_recently_bound_entries() {
    let (mut cache, _calls) = cache_with_counter(CacheConfig::default());
    let mem = memory_with_rgba8_at(0x1000, 16, 16);

    cache
        .load(
            &mem,
            0,
            0x1000,
            16,
            16,
            SourceFormat::Rgba8,
            0,
            PaletteFormat::Ia8,
            false,
            0,
        )
        .unwrap();

    for _ in 0..150 {
        cache.advance_frame();
    }
    // Re-bind refreshes the stamp.
    cache
        .load(
            &mem,
            0,
            0x1000,
            16,
            16,
            SourceFormat::Rgba8,
            0,
            PaletteFormat::Ia8,
            false,
            0,
        )
        .unwrap();

    for _ in 0..150 {
        cache.advance_frame();
    }
    cache.cleanup(cache.frame_count());
    // 150 frames since last bind: under the threshold, still resident.
    assert_eq!(cache.entry_count(), 1);

    for _ in 0..100 {
        cache.advance_frame();
    }
    cache.cleanup(cache.frame_count());
    assert_eq!(cache.entry_count(), 0);
}

#[test]
fn full_frame_loop_with_deferred_invalidation() {
    let (mut cache, calls) = cache_with_counter(CacheConfig::default());
    let mem = memory_with_rgba8_at(0x1000, 32, 32);

    let load = |cache: &mut TextureCache<SoftwareBackend>| {
        cache
            .load(
                &mem,
                0,
                0x1000,
                32,
                32,
                SourceFormat::Rgba8,
                0,
                PaletteFormat::Ia8,
                false,
                0,
            )
            .is_some()
    };

    assert!(load(&mut cache));
    cache.invalidate_defer();
    // Entries stay live until the frame boundary.
    assert!(load(&mut cache));
    assert_eq!(calls.get(), 1);

    cache.flush_deferred();
    cache.advance_frame();
    assert_eq!(cache.entry_count(), 0);
    assert!(load(&mut cache));
    assert_eq!(calls.get(), 2);
}
