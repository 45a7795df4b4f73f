//! Orbit file splicing on disk and marker edge cases

use gnss_data_downloader::stitch::{backup_path, merge, stitch, SpliceMarkers};
use proptest::prelude::*;
use std::fs;

fn sp3_day(tag: &str) -> String {
    format!(
        "#dP2023  6 15  0  0  0.00000000      96 ORBIT IGb20 HLM  IGS\n\
         ## {tag}\n\
         /* synthetic\n\
         *  2023  6 15  0  0  0.00000000 {tag}\n\
         PG01 {tag}-1\n\
         PG02 {tag}-2\n\
         EOF\n"
    )
}

#[test]
fn test_three_days_share_one_header() {
    let dir = tempfile::tempdir().unwrap();
    let paths = ["igs22663.sp3", "igs22664.sp3", "igs22665.sp3"].map(|n| dir.path().join(n));
    for (path, tag) in paths.iter().zip(["prior", "current", "next"]) {
        fs::write(path, sp3_day(tag)).unwrap();
    }

    let merged = stitch([&paths[0], &paths[1], &paths[2]], &SpliceMarkers::default()).unwrap();
    assert!(merged);

    let text = fs::read_to_string(&paths[1]).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.iter().filter(|l| l.starts_with("#dP")).count(), 1);
    assert_eq!(lines[1], "## current");
    let data: Vec<&str> = lines.iter().copied().filter(|l| l.starts_with("PG")).collect();
    assert_eq!(
        data,
        vec![
            "PG01 prior-1",
            "PG02 prior-2",
            "PG01 current-1",
            "PG02 current-2",
            "PG01 next-1",
            "PG02 next-2",
        ]
    );
    assert_eq!(lines.last(), Some(&"EOF"));
    assert_eq!(lines.iter().filter(|l| **l == "EOF").count(), 1);

    // neighbours are untouched, the middle file is backed up
    assert_eq!(fs::read_to_string(&paths[0]).unwrap(), sp3_day("prior"));
    assert_eq!(fs::read_to_string(backup_path(&paths[1])).unwrap(), sp3_day("current"));
}

#[test]
fn test_missing_neighbour_skips_stitch() {
    let dir = tempfile::tempdir().unwrap();
    let prior = dir.path().join("a.sp3");
    let current = dir.path().join("b.sp3");
    let next = dir.path().join("c.sp3");
    fs::write(&current, sp3_day("current")).unwrap();
    fs::write(&next, sp3_day("next")).unwrap();

    assert!(!stitch([&prior, &current, &next], &SpliceMarkers::default()).unwrap());
    assert_eq!(fs::read_to_string(&current).unwrap(), sp3_day("current"));
    assert!(!backup_path(&current).exists());
}

#[test]
fn test_custom_markers() {
    let markers = SpliceMarkers {
        data: "+ ".to_string(),
        end: "END".to_string(),
    };
    let file = |tag: &str| format!("head {tag}\n+ {tag}\nrow {tag}\nEND\n");
    let merged = merge(&file("a"), &file("b"), &file("c"), &markers);
    assert_eq!(merged, "head b\n+ a\nrow a\n+ b\nrow b\n+ c\nrow c\nEND\n");
}

/// One synthetic file: header lines, epoch blocks and an optional end marker
#[derive(Debug, Clone)]
struct Synthetic {
    header: Vec<String>,
    blocks: Vec<(String, Vec<String>)>,
    has_end: bool,
}

impl Synthetic {
    fn text(&self) -> String {
        let mut out = String::new();
        for line in &self.header {
            out.push_str(line);
            out.push('\n');
        }
        for (epoch, rows) in &self.blocks {
            out.push_str(epoch);
            out.push('\n');
            for row in rows {
                out.push_str(row);
                out.push('\n');
            }
        }
        if self.has_end {
            out.push_str("EOF\n");
        }
        out
    }

    fn data_lines(&self) -> Vec<String> {
        self.blocks
            .iter()
            .flat_map(|(epoch, rows)| std::iter::once(epoch.clone()).chain(rows.iter().cloned()))
            .collect()
    }
}

fn arb_synthetic() -> impl Strategy<Value = Synthetic> {
    let header = prop::collection::vec("[#%+/][a-zA-Z0-9 ]{0,12}", 0..4);
    let block = (
        "\\* [0-9]{4} [0-9 ]{0,8}",
        prop::collection::vec("P[A-Z][0-9]{2} [0-9.]{1,10}", 0..3),
    );
    let blocks = prop::collection::vec(block, 0..4);
    (header, blocks, any::<bool>()).prop_map(|(header, blocks, has_end)| Synthetic {
        header,
        blocks,
        has_end,
    })
}

proptest! {
    #[test]
    fn prop_merge_keeps_middle_header_and_orders_data(
        prior in arb_synthetic(),
        current in arb_synthetic(),
        next in arb_synthetic(),
    ) {
        let merged = merge(&prior.text(), &current.text(), &next.text(), &SpliceMarkers::default());
        let lines: Vec<String> = merged.lines().map(str::to_string).collect();

        let mut expected = current.header.clone();
        expected.extend(prior.data_lines());
        expected.extend(current.data_lines());
        expected.extend(next.data_lines());
        expected.push("EOF".to_string());

        prop_assert_eq!(lines, expected);
    }

    #[test]
    fn prop_merge_has_exactly_one_end_marker(
        prior in arb_synthetic(),
        current in arb_synthetic(),
        next in arb_synthetic(),
    ) {
        let merged = merge(&prior.text(), &current.text(), &next.text(), &SpliceMarkers::default());
        prop_assert_eq!(merged.lines().filter(|l| *l == "EOF").count(), 1);
        prop_assert!(merged.ends_with("EOF\n"));
    }
}
