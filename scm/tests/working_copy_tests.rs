use git2::{Commit, Oid, Repository, Signature, Time};
use scm::enumerate::is_commit_id;
use scm::*;
use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;

const NEW_YEAR_2021: i64 = 1_609_459_200;

/// Bare "remote" repository built commit by commit
struct Upstream {
    dir: TempDir,
    repo: Repository,
}

impl Upstream {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init_bare(dir.path()).unwrap();
        Self { dir, repo }
    }

    fn url(&self) -> String {
        self.dir.path().to_str().unwrap().to_string()
    }

    fn remote(&self, name: &str) -> RepositoryRef {
        RepositoryRef::new(name, self.url())
    }

    fn commit(&self, branch: &str, file: &str, seconds: i64, parents: &[Oid]) -> Oid {
        let blob = self.repo.blob(file.as_bytes()).unwrap();
        let mut builder = self.repo.treebuilder(None).unwrap();
        builder.insert(file, blob, 0o100644).unwrap();
        let tree = self.repo.find_tree(builder.write().unwrap()).unwrap();

        let parents: Vec<Commit<'_>> = parents
            .iter()
            .map(|oid| self.repo.find_commit(*oid).unwrap())
            .collect();
        let parent_refs: Vec<&Commit<'_>> = parents.iter().collect();

        let signature =
            Signature::new("A B", "ab@example.com", &Time::new(seconds, 0)).unwrap();
        let oid = self
            .repo
            .commit(
                Some(&format!("refs/heads/{}", branch)),
                &signature,
                &signature,
                &format!("add {}", file),
                &tree,
                &parent_refs,
            )
            .unwrap();
        self.repo.set_head("refs/heads/main").unwrap();
        oid
    }

    fn tag(&self, name: &str, target: Oid, annotated: bool) {
        let object = self.repo.find_object(target, None).unwrap();
        if annotated {
            let tagger = Signature::new("Rel Eng", "rel@example.com", &Time::new(0, 0)).unwrap();
            self.repo
                .tag(name, &object, &tagger, "release", false)
                .unwrap();
        } else {
            self.repo.tag_lightweight(name, &object, false).unwrap();
        }
    }
}

fn working_copy(root: &Path, remote: RepositoryRef) -> WorkingCopyHandle {
    WorkingCopyHandle::for_remote(&root.join(".revpick"), remote)
}

#[tokio::test]
async fn test_sync_clones_once_then_fetches() {
    let upstream = Upstream::new();
    upstream.commit("main", "README", NEW_YEAR_2021, &[]);

    let workspace = tempfile::tempdir().unwrap();
    let handle = working_copy(workspace.path(), upstream.remote("origin"));
    let backend = LibGitBackend::new();

    assert!(!handle.exists());
    assert_eq!(sync(&backend, &handle).await.unwrap(), SyncOutcome::Cloned);
    assert!(handle.exists());
    assert_eq!(sync(&backend, &handle).await.unwrap(), SyncOutcome::Fetched);
    assert_eq!(sync(&backend, &handle).await.unwrap(), SyncOutcome::Fetched);
}

#[tokio::test]
async fn test_fetch_picks_up_new_commits() {
    let upstream = Upstream::new();
    let first = upstream.commit("main", "a.txt", NEW_YEAR_2021, &[]);

    let workspace = tempfile::tempdir().unwrap();
    let handle = working_copy(workspace.path(), upstream.remote("origin"));
    let backend = LibGitBackend::new();
    sync(&backend, &handle).await.unwrap();

    let second = upstream.commit("main", "b.txt", NEW_YEAR_2021 + 60, &[first]);
    assert_eq!(sync(&backend, &handle).await.unwrap(), SyncOutcome::Fetched);

    let ids = list_revisions(&backend, handle.path(), Some("main"))
        .await
        .unwrap();
    assert_eq!(ids, vec![second.to_string(), first.to_string()]);
}

#[tokio::test]
async fn test_all_branches_are_unique_and_complete() {
    let upstream = Upstream::new();
    let root = upstream.commit("main", "root.txt", NEW_YEAR_2021, &[]);
    let main_tip = upstream.commit("main", "main.txt", NEW_YEAR_2021 + 10, &[root]);
    let feature_tip = upstream.commit("feature", "feature.txt", NEW_YEAR_2021 + 20, &[root]);

    let workspace = tempfile::tempdir().unwrap();
    let handle = working_copy(workspace.path(), upstream.remote("origin"));
    let backend = LibGitBackend::new();
    sync(&backend, &handle).await.unwrap();

    let ids = list_revisions(&backend, handle.path(), None).await.unwrap();
    let unique: HashSet<&String> = ids.iter().collect();

    assert_eq!(ids.len(), 3);
    assert_eq!(unique.len(), ids.len());
    assert!(ids.iter().all(|id| is_commit_id(id)));
    for expected in [root, main_tip, feature_tip] {
        assert!(ids.contains(&expected.to_string()));
    }

    let feature = list_revisions(&backend, handle.path(), Some("feature"))
        .await
        .unwrap();
    assert_eq!(feature, vec![feature_tip.to_string(), root.to_string()]);
}

#[tokio::test]
async fn test_single_branch_walks_agree() {
    let upstream = Upstream::new();
    let first = upstream.commit("main", "a.txt", NEW_YEAR_2021, &[]);
    upstream.commit("main", "b.txt", NEW_YEAR_2021 + 1, &[first]);

    let workspace = tempfile::tempdir().unwrap();
    let handle = working_copy(workspace.path(), upstream.remote("origin"));
    let backend = LibGitBackend::new();
    sync(&backend, &handle).await.unwrap();

    let branch: HashSet<String> = list_revisions(&backend, handle.path(), Some("main"))
        .await
        .unwrap()
        .into_iter()
        .collect();
    let all: HashSet<String> = list_revisions(&backend, handle.path(), None)
        .await
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(branch, all);
}

#[tokio::test]
async fn test_tags_include_lightweight_and_annotated() {
    let upstream = Upstream::new();
    let first = upstream.commit("main", "a.txt", NEW_YEAR_2021, &[]);
    let second = upstream.commit("main", "b.txt", NEW_YEAR_2021 + 1, &[first]);
    upstream.tag("v1.0", first, false);
    upstream.tag("v2.0", second, true);

    let workspace = tempfile::tempdir().unwrap();
    let handle = working_copy(workspace.path(), upstream.remote("origin"));
    let backend = LibGitBackend::new();
    sync(&backend, &handle).await.unwrap();

    let mut tags = list_tags(&backend, handle.path()).await.unwrap();
    tags.sort();
    assert_eq!(tags, vec!["v1.0", "v2.0"]);
}

#[tokio::test]
async fn test_describe_reads_author_line() {
    let upstream = Upstream::new();
    let oid = upstream.commit("main", "a.txt", NEW_YEAR_2021, &[]);

    let workspace = tempfile::tempdir().unwrap();
    let handle = working_copy(workspace.path(), upstream.remote("origin"));
    let backend = LibGitBackend::new();
    sync(&backend, &handle).await.unwrap();

    let record = describe(&backend, handle.path(), &oid.to_string()).await;
    assert_eq!(record.epoch_seconds, Some(NEW_YEAR_2021));
    assert_eq!(
        record.label(),
        format!("{} A B <ab@example.com> 2021-01-01 00:00", oid)
    );

    let unknown = describe(&backend, handle.path(), &"f".repeat(40)).await;
    assert_eq!(unknown.author_line, None);
    assert_eq!(unknown.label(), format!("{}  ", "f".repeat(40)));
}

#[tokio::test]
async fn test_enumerating_without_working_copy_fails() {
    let workspace = tempfile::tempdir().unwrap();
    let backend = LibGitBackend::new();
    let missing = workspace.path().join("never-synced");

    let err = list_revisions(&backend, &missing, None).await.unwrap_err();
    assert!(matches!(err, RepositoryStateError::MissingWorkingCopy { .. }));

    let err = list_tags(&backend, &missing).await.unwrap_err();
    assert!(matches!(err, RepositoryStateError::MissingWorkingCopy { .. }));
}

#[tokio::test]
async fn test_unreachable_remote_is_a_sync_error() {
    let workspace = tempfile::tempdir().unwrap();
    let missing_remote = workspace.path().join("no-such-remote");
    let remote = RepositoryRef::new("origin", missing_remote.display().to_string());
    let handle = working_copy(workspace.path(), remote);

    let err = sync(&LibGitBackend::new(), &handle).await.unwrap_err();
    assert!(matches!(err, SyncError::Clone { .. }));
}

#[tokio::test]
async fn test_process_backend_pipeline() {
    let backend = ProcessBackend::from_locator(&GitToolLocator::default());
    if !backend.is_available().await {
        // No git executable installed, nothing to exercise
        return;
    }

    let upstream = Upstream::new();
    let first = upstream.commit("main", "a.txt", NEW_YEAR_2021, &[]);
    let second = upstream.commit("main", "b.txt", NEW_YEAR_2021 + 60, &[first]);
    upstream.tag("v1.0", first, false);

    let workspace = tempfile::tempdir().unwrap();
    let handle = working_copy(workspace.path(), upstream.remote("origin"));

    assert_eq!(sync(&backend, &handle).await.unwrap(), SyncOutcome::Cloned);
    assert_eq!(sync(&backend, &handle).await.unwrap(), SyncOutcome::Fetched);

    let ids = list_revisions(&backend, handle.path(), Some("main"))
        .await
        .unwrap();
    assert_eq!(ids, vec![second.to_string(), first.to_string()]);

    let tags = list_tags(&backend, handle.path()).await.unwrap();
    assert_eq!(tags, vec!["v1.0"]);

    let record = describe(&backend, handle.path(), &first.to_string()).await;
    assert_eq!(record.identity(), "A B <ab@example.com>");
    assert_eq!(record.formatted_date(), "2021-01-01 00:00");
}
