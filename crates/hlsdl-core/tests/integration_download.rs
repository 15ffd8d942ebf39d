//! Integration test: local HTTP server, playlist load, pooled download and merge.
//!
//! Serves a media playlist, an AES-128 key and segments, some of which fail
//! before succeeding, and asserts the merged file equals the ordered plaintext.

mod common;

use common::segment_server::SegmentServer;
use hlsdl_core::crypto::aes128_cbc_encrypt;
use hlsdl_core::downloader::{DownloadOptions, Downloader};
use hlsdl_core::fetch::{ClientConfig, CurlFetcher, Fetcher};
use hlsdl_core::merge::MergeMethod;
use hlsdl_core::playlist;
use hlsdl_core::retry::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

const KEY: &[u8; 16] = b"8dv4byf8b9e6bc1x";
const IV: &[u8; 16] = b"xduio1f8a12348u4";

fn fetcher() -> Arc<dyn Fetcher> {
    Arc::new(CurlFetcher::new(ClientConfig {
        connect_timeout: Duration::from_secs(5),
        request_timeout: Duration::from_secs(10),
        ..ClientConfig::default()
    }))
}

fn options(dir: &std::path::Path, retry: RetryPolicy) -> DownloadOptions {
    DownloadOptions {
        output_dir: dir.to_path_buf(),
        filename: "main.ts".into(),
        threads: 3,
        use_external_muxer: false,
        retry,
    }
}

/// Segment plaintext: a few junk bytes, then a sync byte and a payload.
fn plaintext(i: usize) -> (Vec<u8>, Vec<u8>) {
    let payload: Vec<u8> = std::iter::once(0x47u8)
        .chain((0..200).map(|b| (b as u8).wrapping_mul(i as u8 + 1)))
        .collect();
    let mut raw = vec![0xAA; i % 3];
    raw.extend_from_slice(&payload);
    (raw, payload)
}

#[test]
fn encrypted_playlist_with_flaky_segment_merges_in_order() {
    let server = SegmentServer::start();
    let mut manifest = String::from("#EXTM3U\n#EXT-X-TARGETDURATION:4\n#EXT-X-MEDIA-SEQUENCE:0\n");
    manifest.push_str(&format!(
        "#EXT-X-KEY:METHOD=AES-128,URI=\"keys/k.bin\",IV=0x{}\n",
        hex::encode(IV)
    ));

    let mut expected = Vec::new();
    for i in 0..6 {
        let (raw, payload) = plaintext(i);
        expected.extend_from_slice(&payload);
        let body = aes128_cbc_encrypt(&raw, KEY, IV).unwrap();
        server.serve(&format!("seg/{}.ts", i), body);
        manifest.push_str(&format!("#EXTINF:4.0,\nseg/{}.ts\n", i));
    }
    manifest.push_str("#EXT-X-ENDLIST\n");
    server.serve("index.m3u8", manifest);
    server.serve("keys/k.bin", KEY.to_vec());
    server.fail("seg/2.ts", 2);

    let fetcher = fetcher();
    let manifest_url = server.url("index.m3u8");
    let source = playlist::load(fetcher.as_ref(), &manifest_url).unwrap();
    assert_eq!(source.len(), 6);
    assert_eq!(server.hits("keys/k.bin"), 1);

    let out_dir = tempdir().unwrap();
    let dl = Downloader::new(
        &manifest_url,
        source,
        fetcher,
        options(out_dir.path(), RetryPolicy::immediate()),
    )
    .unwrap();
    let seg_dir = dl.segment_dir().to_path_buf();
    let report = dl.run(None).unwrap();

    assert!(report.is_complete(), "report: {:?}", report);
    assert_eq!(report.merge.method, MergeMethod::Concat);
    assert_eq!(report.pool.failed_attempts, 2);
    assert_eq!(server.hits("seg/2.ts"), 3);
    assert_eq!(std::fs::read(&report.merge.output).unwrap(), expected);
    assert!(!seg_dir.exists(), "segment directory should be removed");
}

#[test]
fn missing_segment_gives_partial_output_after_retry_cap() {
    let server = SegmentServer::start();
    let mut manifest = String::from("#EXTM3U\n#EXT-X-TARGETDURATION:4\n");
    for i in 0..4 {
        if i != 1 {
            server.serve(&format!("live/{}.ts", i), vec![0x47, i as u8]);
        }
        manifest.push_str(&format!("#EXTINF:4.0,\n{}.ts\n", i));
    }
    manifest.push_str("#EXT-X-ENDLIST\n");
    server.serve("live/index.m3u8", manifest);

    let fetcher = fetcher();
    let manifest_url = server.url("live/index.m3u8");
    let source = playlist::load(fetcher.as_ref(), &manifest_url).unwrap();

    let out_dir = tempdir().unwrap();
    let retry = RetryPolicy {
        max_attempts: Some(3),
        ..RetryPolicy::immediate()
    };
    let dl = Downloader::new(&manifest_url, source, fetcher, options(out_dir.path(), retry)).unwrap();
    let report = dl.run(None).unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.pool.abandoned, 1);
    assert_eq!(report.merge.missing, 1);
    assert_eq!(server.hits("live/1.ts"), 3);
    assert_eq!(
        std::fs::read(&report.merge.output).unwrap(),
        vec![0x47, 0, 0x47, 2, 0x47, 3]
    );
}

#[test]
fn master_playlist_follows_best_variant() {
    let server = SegmentServer::start();
    server.serve(
        "master.m3u8",
        "#EXTM3U\n#EXT-X-STREAM-INF:BANDWIDTH=800000\nsd/index.m3u8\n#EXT-X-STREAM-INF:BANDWIDTH=3000000\nhd/index.m3u8\n",
    );
    server.serve(
        "hd/index.m3u8",
        "#EXTM3U\n#EXT-X-TARGETDURATION:4\n#EXTINF:4.0,\na.ts\n#EXTINF:4.0,\nb.ts\n#EXT-X-ENDLIST\n",
    );
    server.serve("hd/a.ts", vec![0x47, 0xA]);
    server.serve("hd/b.ts", vec![0x47, 0xB]);

    let fetcher = fetcher();
    let master_url = server.url("master.m3u8");
    let source = playlist::load(fetcher.as_ref(), &master_url).unwrap();
    assert_eq!(source.base_url.as_str(), server.url("hd/index.m3u8"));

    let out_dir = tempdir().unwrap();
    let dl = Downloader::new(
        &master_url,
        source,
        fetcher,
        options(out_dir.path(), RetryPolicy::immediate()),
    )
    .unwrap();
    let report = dl.run(None).unwrap();
    assert!(report.is_complete());
    assert_eq!(std::fs::read(&report.merge.output).unwrap(), vec![0x47, 0xA, 0x47, 0xB]);
    assert_eq!(server.hits("sd/index.m3u8"), 0);
}
