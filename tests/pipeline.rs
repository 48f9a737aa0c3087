use kinmap::config::Mode;
use kinmap::prelude::*;
use std::error::Error;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const KIN0: &str = "FID1,ID1,FID2,ID2,N_SNP,HetHet,IBS0,Kinship\n\
                    K,K01,K,K02,5000,0.080,0.0010,0.400\n\
                    K,K01,K,K03,5000,0.050,0.0100,0.200\n\
                    K,K02,K,K04,5000,0.010,0.0400,0.060\n\
                    K,K03,K,K05,5000,0.001,0.2000,-0.100\n\
                    K,K05,K,K99,5000,0.001,0.2000,-0.050\n";

const INDIVIDUALS: &str = "ID\tsex\tSL\tsocial_rank\tHarem_ID\tLongitude\tLatitude\n\
                           K01\tM\t60\tBM\tH1\t30.100\t-8.200\n\
                           K02\tF\t45\tBF\tH1\t30.101\t-8.201\n\
                           K03\tF\tNA\tH\tH1\t30.102\t-8.203\n\
                           K04\tNA\t30\tJ\tH2\t30.110\t-8.210\n";

const NESTS: &str = "ID\tsex\tSL\tsocial_rank\tHarem_ID\tHarem_ID_Nest_ID\tLongitude\tLatitude\n\
                     K01\tF\t99\tSM\tH9\tH1_N1\t0\t0\n\
                     K02\tF\t45\tBF\tH1\tH1_N1\t30.101\t-8.201\n\
                     K03\tF\tNA\tH\tH1\tH1_N2\t30.102\t-8.203\n\
                     K05\tF\t40\tBF\tH2\tH2_N1\t30.120\t-8.220\n";

const RULES: &str = r#"
[[classification.rules]]
name = "Degree1"
min_hethet = 0.07
max_ibs0 = 0.002
min_kinship = 0.35
color = "blue"

[[classification.rules]]
name = "Degree2"
min_hethet = 0.03
max_ibs0 = 0.02
min_kinship = 0.17
color = "green"

[[classification.rules]]
name = "Degree3"
min_hethet = 0.0
max_ibs0 = 0.05
min_kinship = 0.05
color = "orange"
"#;

fn write(dir: &Path, name: &str, contents: &str) -> std::result::Result<(), Box<dyn Error>> {
    fs::write(dir.join(name), contents)?;
    Ok(())
}

fn workspace() -> std::result::Result<(TempDir, Config), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    write(dir.path(), "king.kin0.csv", KIN0)?;
    write(dir.path(), "individual_info", INDIVIDUALS)?;
    write(dir.path(), "nest_info.txt", NESTS)?;
    let config = format!(
        "[inputs]\n\
         kinship = \"king.kin0.csv\"\n\
         metadata = [\"individual_info\", \"nest_info.txt\"]\n\
         {RULES}\n\
         [render]\n\
         output = \"network.svg\"\n"
    );
    write(dir.path(), "kinmap.toml", &config)?;
    let config = Config::from_file(dir.path().join("kinmap.toml"))?;
    Ok((dir, config))
}

#[test]
fn test_threshold_run_classifies_and_draws() -> std::result::Result<(), Box<dyn Error>> {
    let (dir, config) = workspace()?;
    let summary = Pipeline::new(config)?.run()?;

    // K01..K05 plus K99 from the kinship table.
    assert_eq!(summary.nodes, 6);
    assert_eq!(summary.mode, Mode::Threshold);
    assert_eq!(
        summary.categories,
        vec![
            ("Degree1".to_string(), 1),
            ("Degree2".to_string(), 1),
            ("Degree3".to_string(), 1),
        ]
    );
    assert_eq!(summary.kinship_edges, 3);
    // Groups come from the nest table alone: harem H1 is K02 and K03 there,
    // while K01 is listed under H9.
    assert_eq!(summary.harem_edges, 1);
    // Nest H1_N1 is K01 and K02.
    assert_eq!(summary.nest_edges, 1);

    let svg = fs::read_to_string(dir.path().join("network.svg"))?;
    assert!(svg.contains("K99"));
    assert!(svg.contains("Degree3"));
    Ok(())
}

#[test]
fn test_stages_expose_graph_and_defaults() -> std::result::Result<(), Box<dyn Error>> {
    let (_dir, config) = workspace()?;
    let pipeline = Pipeline::new(config)?;
    let dataset = pipeline.load()?;
    // The first metadata table wins for K01.
    assert_eq!(dataset.individuals["K01"].sex, Sex::Male);

    let classified = pipeline.classify(&dataset)?;
    let network = pipeline.network(&dataset, &classified)?;
    assert_eq!(network.graph.category("K02", "K01"), Some("Degree1"));
    assert_eq!(network.graph.category("K03", "K05"), None);
    assert_eq!(network.attributes.len(), network.graph.node_count());

    // K99 appears only in the kinship table.
    let k99 = network.graph.node_index("K99").unwrap();
    let attrs = network.attributes[k99.index()];
    assert_eq!(attrs.position, (0.0, 0.0));
    assert_eq!(attrs.fill, network.palette.default_color());
    assert_eq!(attrs.border, network.palette.default_color());
    assert_eq!(attrs.size, pipeline.config().size.min);

    // K01 has the largest SL among the merged rows.
    let k01 = network.graph.node_index("K01").unwrap();
    assert_eq!(network.attributes[k01.index()].size, pipeline.config().size.max);
    Ok(())
}

#[test]
fn test_configured_group_table() -> std::result::Result<(), Box<dyn Error>> {
    let (dir, _) = workspace()?;
    let config = format!(
        "[inputs]\n\
         kinship = \"king.kin0.csv\"\n\
         metadata = [\"individual_info\", \"nest_info.txt\"]\n\
         groups = \"individual_info\"\n\
         {RULES}"
    );
    write(dir.path(), "groups.toml", &config)?;
    let config = Config::from_file(dir.path().join("groups.toml"))?;

    let pipeline = Pipeline::new(config)?;
    let dataset = pipeline.load()?;
    assert_eq!(dataset.group_rows.len(), 4);
    let network = pipeline.network(&dataset, &pipeline.classify(&dataset)?)?;
    // H1 is K01, K02, K03 in the main table, which has no nest column.
    assert_eq!(network.graph.harem_edges().len(), 3);
    assert!(network.graph.nest_edges().is_empty());
    Ok(())
}

#[test]
fn test_missing_kinship_column_aborts_before_drawing() -> std::result::Result<(), Box<dyn Error>> {
    let (dir, config) = workspace()?;
    write(dir.path(), "king.kin0.csv", "ID1,ID2,HetHet,IBS0\nK01,K02,0.08,0.001\n")?;

    let err = Pipeline::new(config)?.run().unwrap_err();
    match &err {
        KinError::MissingColumns { missing, .. } => assert_eq!(missing, &vec!["Kinship".to_string()]),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("Kinship"));
    assert!(!dir.path().join("network.svg").exists());
    Ok(())
}

#[test]
fn test_legacy_run_deduplicates_degree_tables() -> std::result::Result<(), Box<dyn Error>> {
    let (dir, _) = workspace()?;
    write(dir.path(), "degree1.csv", "ID1,ID2,HetHet,IBS0,Kinship\nK01,K02,0.08,0.001,0.4\n")?;
    write(
        dir.path(),
        "degree2.csv",
        "ID1,ID2,HetHet,IBS0,Kinship\nK02,K01,0.05,0.01,0.2\nK01,K03,0.05,0.01,0.2\n",
    )?;
    write(
        dir.path(),
        "degree3.csv",
        "ID1,ID2,HetHet,IBS0,Kinship\nK03,K01,0.01,0.04,0.06\nK04,K05,0.01,0.04,0.06\n",
    )?;
    let legacy = "[classification]\nmode = \"legacy\"\n\n\
                  [[inputs.degree_tables]]\ncategory = \"Degree1\"\npath = \"degree1.csv\"\n\n\
                  [[inputs.degree_tables]]\ncategory = \"Degree2\"\npath = \"degree2.csv\"\n\n\
                  [[inputs.degree_tables]]\ncategory = \"Degree3\"\npath = \"degree3.csv\"\ncolor = \"#ff8800\"\n";
    // The inputs table must stay in one place in TOML, so rebuild the file.
    let config = format!(
        "[inputs]\nkinship = \"king.kin0.csv\"\nmetadata = [\"individual_info\", \"nest_info.txt\"]\n\n{legacy}\n{RULES}"
    );
    write(dir.path(), "legacy.toml", &config)?;
    let config = Config::from_file(dir.path().join("legacy.toml"))?;

    let pipeline = Pipeline::new(config)?;
    let dataset = pipeline.load()?;
    let classified = pipeline.classify(&dataset)?;
    assert_eq!(classified.len(), 3);

    let network = pipeline.network(&dataset, &classified)?;
    assert_eq!(network.graph.category("K01", "K02"), Some("Degree1"));
    assert_eq!(network.graph.category("K01", "K03"), Some("Degree2"));
    assert_eq!(network.graph.category("K04", "K05"), Some("Degree3"));
    assert_eq!(network.palette.category_color("Degree3"), plotters::style::RGBColor(0xff, 0x88, 0x00));

    let summary = pipeline.run_to(&dir.path().join("legacy.svg"))?;
    assert_eq!(summary.kinship_edges, 3);
    assert!(dir.path().join("legacy.svg").exists());
    Ok(())
}

#[test]
fn test_demo_config_runs() -> std::result::Result<(), Box<dyn Error>> {
    let out = tempfile::tempdir()?;
    let mut config = Config::from_file(Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/kinmap.toml"))?;
    config.render.output = out.path().join("demo.svg");

    let summary = Pipeline::new(config)?.run()?;
    assert_eq!(summary.nodes, 8);
    assert_eq!(
        summary.categories,
        vec![
            ("Clone".to_string(), 1),
            ("Degree1".to_string(), 2),
            ("Degree2".to_string(), 3),
            ("Degree3".to_string(), 1),
        ]
    );
    assert_eq!(summary.harem_edges, 2);
    assert_eq!(summary.nest_edges, 1);
    assert!(out.path().join("demo.svg").exists());
    Ok(())
}
