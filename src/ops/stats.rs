use crate::io::kv::KvStore;
use crate::model::task::Task;
use crate::ops::store::Store;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: usize,
    pub todo: usize,
    pub done: usize,
    pub starred: usize,
}

impl TaskCounts {
    fn add(&mut self, task: &Task) {
        self.total += 1;
        if task.is_done() {
            self.done += 1;
        } else {
            self.todo += 1;
        }
        if task.starred {
            self.starred += 1;
        }
    }
}

pub fn counts<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> TaskCounts {
    let mut counts = TaskCounts::default();
    for task in tasks {
        counts.add(task);
    }
    counts
}

/// Per-folder breakdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderStats {
    pub name: String,
    pub counts: TaskCounts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub folders: Vec<FolderStats>,
    /// Tasks that belong to no folder
    pub unfiled: TaskCounts,
    pub totals: TaskCounts,
}

pub fn store_stats<S: KvStore>(store: &Store<S>) -> StoreStats {
    let folders = store
        .folders()
        .iter()
        .map(|folder| FolderStats {
            name: folder.name.clone(),
            counts: counts(folder.tasks.iter().filter_map(|id| store.task(*id))),
        })
        .collect();

    StoreStats {
        folders,
        unfiled: counts(
            store
                .tasks()
                .iter()
                .filter(|t| store.folder_of(t.id).is_none()),
        ),
        totals: counts(store.tasks()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::kv::MemoryStore;
    use crate::model::view::FolderView;
    use crate::ops::store::NewTask;

    #[test]
    fn counts_split_by_flag() {
        let mut store = Store::open(MemoryStore::new());
        store.add_folder("Work");
        let a = store.add_task(NewTask::new("a").in_folder(FolderView::parse("Work")));
        store.add_task(NewTask::new("b").starred(true).in_folder(FolderView::parse("Work")));
        store.add_task(NewTask::new("c").starred(true));
        store.toggle_task_state(a.id);

        let stats = store_stats(&store);
        assert_eq!(
            stats.totals,
            TaskCounts {
                total: 3,
                todo: 2,
                done: 1,
                starred: 2
            }
        );
        assert_eq!(stats.folders.len(), 1);
        assert_eq!(stats.folders[0].name, "Work");
        assert_eq!(stats.folders[0].counts.total, 2);
        assert_eq!(stats.folders[0].counts.done, 1);
        assert_eq!(stats.unfiled.total, 1);
        assert_eq!(stats.unfiled.starred, 1);
    }

    #[test]
    fn empty_store() {
        let store = Store::open(MemoryStore::new());
        let stats = store_stats(&store);
        assert_eq!(stats.totals, TaskCounts::default());
        assert!(stats.folders.is_empty());
    }
}
