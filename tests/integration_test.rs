/// End-to-end integration tests for the code-scribe pipeline.
///
/// Tests the complete flow:
///   Index → Combined index → Query → Draft → Mapping → Prompts → Translate
use code_scribe::annotator::{AnnotateOutcome, annotate_fortran_file, extract_fortran_meta};
use code_scribe::batch::BatchRunner;
use code_scribe::config::Config;
use code_scribe::error::ScribeError;
use code_scribe::generator::mock::EchoGenerator;
use code_scribe::indexer::{
    CombinedIndex, SIDECAR_FILE_NAME, ScribeIndexer, load_scribe_yaml, query_construct,
};
use code_scribe::prompt::{ChatTemplate, create_src_mapping, save_prompts, translate};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const GRID: &str = "\
! Grid definitions
      module grid_data
      integer, parameter :: nx = 64
      real(kind=8), dimension(nx) :: u
      end module grid_data
";

const SOLVER: &str = "\
c     Explicit heat solver
      subroutine step(u, dt)
      use grid_data
      implicit none
      real(kind=8) :: dt
      double precision u(nx)
      u(1) = u(1) + dt*u(2)**2
      end subroutine step

      function energy(u)
      real(kind=8) :: energy, u(nx)
      energy = sum(u**2)
      end function energy
";

const TEMPLATE: &str = r#"
[[chat]]
role = "system"
content = "You convert Fortran to C++."

[[chat]]
role = "user"
content = "Translate the file below."
"#;

fn write_project(root: &Path) {
    fs::create_dir_all(root.join("src/grid")).unwrap();
    fs::create_dir_all(root.join("src/solver")).unwrap();
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::write(root.join("src/grid/grid.f90"), GRID).unwrap();
    fs::write(root.join("src/solver/heat.f90"), SOLVER).unwrap();
    fs::write(root.join("docs/README.md"), "# Heat solver\n").unwrap();
}

/// Full pipeline: index → combined index → query → draft → prompts → translate
#[test]
fn test_full_pipeline() {
    // 1. Setup a small Fortran project
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    write_project(root);

    // 2. Index the tree
    let summary = ScribeIndexer::default().index_directory(root).unwrap();
    assert_eq!(summary.files, 2, "Should scan 2 Fortran files");
    assert_eq!(summary.directories, 2, "Should write 2 sidecars");
    assert!(root.join("src/grid").join(SIDECAR_FILE_NAME).is_file());
    assert!(root.join("src/solver").join(SIDECAR_FILE_NAME).is_file());
    assert!(
        !root.join("docs").join(SIDECAR_FILE_NAME).exists(),
        "Directories without sources get no sidecar"
    );
    assert!(
        !root.join(SIDECAR_FILE_NAME).exists(),
        "Root holds no sources, so no sidecar"
    );

    let sidecar = load_scribe_yaml(root.join("src/solver").join(SIDECAR_FILE_NAME)).unwrap();
    let heat = &sidecar.files["heat.f90"];
    assert_eq!(heat.subroutines, vec!["step"]);
    assert_eq!(heat.functions, vec!["energy"]);

    // 3. Combined index from a sidecar directory
    let index = CombinedIndex::load_from(root.join("src/grid")).unwrap();
    assert_eq!(index.len(), 3, "grid_data, step, energy");
    assert!(index.collisions.is_empty());

    // 4. Query
    let hits = query_construct("grid_data", &index).unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].ends_with("src/grid/grid.f90"));
    assert!(query_construct("nonexistent", &index).is_none());

    // 5. Metadata
    let meta = extract_fortran_meta(root.join("src/solver/heat.f90")).unwrap();
    assert_eq!(meta.len(), 2);
    assert_eq!(meta[0].name, "step");
    assert_eq!(meta[0].argument_list, vec!["u", "dt"]);
    assert_eq!(meta[1].name, "energy");

    // 6. Draft
    let source = root.join("src/solver/heat.f90");
    let outcome = annotate_fortran_file(&source, Some(&index)).unwrap();
    let draft_path = root.join("src/solver/heat.scribe");
    assert_eq!(outcome, AnnotateOutcome::Generated(draft_path.clone()));

    let draft = fs::read_to_string(&draft_path).unwrap();
    assert!(draft.starts_with("scribe-prompt:"));
    assert!(draft.contains("#include <grid_data.hpp>"));
    assert!(draft.contains("using namespace grid_data;"));
    assert!(draft.contains("double dt"));
    assert!(draft.contains("FArray<double> u(nx)"));
    assert!(draft.contains("pow(u(2),2)"));
    assert!(!draft.contains("Explicit heat solver"));
    assert!(!draft.to_lowercase().contains("implicit none"));

    // Second run leaves the draft alone
    let again = annotate_fortran_file(&source, Some(&index)).unwrap();
    assert!(again.is_skipped());
    assert_eq!(fs::read_to_string(&draft_path).unwrap(), draft);

    // 7. Mapping + prompt records
    let template_path = root.join("prompt.toml");
    fs::write(&template_path, TEMPLATE).unwrap();
    let template = ChatTemplate::load(&template_path).unwrap();

    let config = Config::default();
    let files = config
        .expand_inputs(&[root.join("src").to_string_lossy().into_owned()])
        .unwrap();
    assert_eq!(files.len(), 2);

    let mapping = create_src_mapping(&files);
    let report = save_prompts(&mapping, &template, &BatchRunner::new(false));
    assert_eq!(report.done(), 2);
    assert!(!report.has_failures());

    let record: ChatTemplate =
        serde_json::from_str(&fs::read_to_string(root.join("src/solver/heat.json")).unwrap())
            .unwrap();
    let last = &record.chat[1].content;
    assert!(last.contains("<source>"));
    assert!(last.contains("<draft>"), "heat.f90 has a draft");
    assert!(!last.contains("Explicit heat solver"));

    let grid_record = fs::read_to_string(root.join("src/grid/grid.json")).unwrap();
    assert!(!grid_record.contains("<draft>"), "grid.f90 has no draft");

    // 8. Echo translation, then skip on rerun
    let generator = EchoGenerator::default();
    let runner = BatchRunner::new(false);
    let report = translate(&mapping, &template, &generator, &runner);
    assert_eq!(report.done(), 2);

    let cpp = fs::read_to_string(root.join("src/solver/heat.cpp")).unwrap();
    assert!(cpp.starts_with("// code-scribe dry run"));
    assert!(cpp.contains("subroutine step(u, dt)"));

    let rerun = translate(&mapping, &template, &generator, &runner);
    assert_eq!(rerun.skipped(), 2);
    assert_eq!(rerun.done(), 0);
}

/// Reindexing after deleting a source drops it from the combined index
#[test]
fn test_reindex_after_delete() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    write_project(root);
    fs::write(root.join("src/solver/extra.f90"), "subroutine extra\nend\n").unwrap();

    ScribeIndexer::default().index_directory(root).unwrap();
    let index = CombinedIndex::load_from(root.join("src/solver")).unwrap();
    assert!(query_construct("extra", &index).is_some());

    fs::remove_file(root.join("src/solver/extra.f90")).unwrap();
    ScribeIndexer::default().index_directory(root).unwrap();
    let index = CombinedIndex::load_from(root.join("src/solver")).unwrap();
    assert!(query_construct("extra", &index).is_none());
    assert!(query_construct("step", &index).is_some());
}

/// Drafting without an index still works; loading one reports how to fix it
#[test]
fn test_draft_without_index() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    write_project(root);

    let err = CombinedIndex::load_from(root).unwrap_err();
    assert!(matches!(err, ScribeError::MissingIndex { .. }));
    assert!(err.to_string().contains("code-scribe index"));

    let outcome = annotate_fortran_file(root.join("src/grid/grid.f90"), None).unwrap();
    assert!(!outcome.is_skipped());
    assert!(root.join("src/grid/grid.scribe").is_file());
}

/// A missing source fails alone; the rest of the batch completes
#[test]
fn test_batch_continues_past_missing_source() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    write_project(root);

    let files = vec![
        root.join("src/grid/grid.f90"),
        root.join("src/missing.f90"),
        root.join("src/solver/heat.f90"),
    ];
    let report = BatchRunner::new(false).run(&files, |f| {
        annotate_fortran_file(f, None).map(Into::into)
    });
    assert_eq!(report.done(), 2);
    assert_eq!(report.failed(), 1);
    assert!(report.outcomes[1].to_string().contains("missing.f90"));

    let stopped = BatchRunner::new(true).run(&files[1..], |f| {
        annotate_fortran_file(f, None).map(Into::into)
    });
    assert!(stopped.aborted);
    assert_eq!(stopped.outcomes.len(), 1);
}
